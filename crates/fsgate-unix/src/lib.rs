// Unix platform implementations

#[cfg(unix)]
pub mod filesystem;

#[cfg(unix)]
pub mod shell;
