// Windows platform implementations

#[cfg(target_os = "windows")]
pub mod filesystem;

#[cfg(target_os = "windows")]
pub mod shell;
