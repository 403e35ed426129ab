// Platform seam shared by the per-OS crates

pub mod filesystem;
pub mod shell;
