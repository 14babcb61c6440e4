//! Binary inspector
//!
//! Extracts identifying metadata (build/debug identifiers, architecture,
//! human name) from debug-symbol binaries and their sidecar debug-info
//! formats:
//! - dSYM-style containers are identified via the external `dwarfdump`
//!   tool ([`dwarf`]).
//! - Dart Android symbol files carry a GNU build id readable straight
//!   from the ELF note section ([`elf`]).
//! - Flat native libraries get a keep-debug-info `objcopy` transform
//!   before upload ([`objcopy`]).

pub mod dwarf;
pub mod elf;
pub mod objcopy;

pub use dwarf::{parse_dwarfdump_output, DwarfInfo};
pub use elf::read_build_id;
pub use objcopy::{debug_output_path, extract_debug_info, ndk_objcopy_path, resolve_ndk_root};

use std::io;
use std::path::PathBuf;

/// Inspector errors
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// A required system tool could not be located. This is a setup
    /// error: it aborts discovery entirely rather than one artifact.
    #[error("unable to locate {tool} on this system")]
    ToolMissing { tool: String },

    /// The NDK root was neither given nor present in the environment.
    #[error("Android NDK root not set, please specify using `--android-ndk-root` or $ANDROID_NDK_ROOT")]
    NdkRootMissing,

    /// The NDK layout did not contain the expected objcopy binary.
    #[error("unable to locate llvm-objcopy within NDK root {0}")]
    ObjcopyNotFound(PathBuf),

    /// The keep-debug-info transform failed for one file.
    #[error("failed to process {file} using objcopy: {detail}")]
    TransformFailed { file: PathBuf, detail: String },

    /// Object file parsing failed.
    #[error("failed to parse {file}: {detail}")]
    Malformed { file: PathBuf, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
