//! Command line interface definition using clap.
//!
//! Each subcommand exposes one library operation so build scripts can query
//! orders, flavors, flags and names without linking against the crate.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Meta-build core: target ordering, toolchain detection and Xcode flag
/// emulation for Ninja backends.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments accepted by the `flags` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct FlagsArgs {
    /// JSON file holding one target description.
    #[arg(value_name = "TARGET")]
    pub target: Utf8PathBuf,

    /// Configuration to read settings from.
    #[arg(short, long, value_name = "NAME")]
    pub configuration: String,

    /// Architecture passed to `-arch`; defaults to the first active one.
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Directory linked products are placed in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub product_dir: String,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Print the target flavor for the configured toolchain.
    Flavor {
        /// Force this flavor instead of detecting it.
        #[arg(long, value_name = "FLAVOR")]
        flavor: Option<String>,
    },

    /// Print the predefined macros of the configured cross-compiler as JSON.
    Predefines,

    /// Print a JSON node list ordered so each node precedes its edges.
    Order {
        /// JSON object mapping each node to the nodes that must follow it.
        #[arg(value_name = "GRAPH")]
        graph: Utf8PathBuf,
    },

    /// Print Xcode-emulated compiler and linker flags as JSON.
    Flags(FlagsArgs),

    /// Print the output file name of a target.
    OutputName {
        /// JSON file holding one target description.
        #[arg(value_name = "TARGET")]
        target: Utf8PathBuf,

        /// Name outputs for this flavor instead of the detected one.
        #[arg(long, value_name = "FLAVOR")]
        flavor: Option<String>,
    },

    /// Print the compilation database of a generated Ninja build.
    Compdb {
        /// Directory containing `build.ninja`.
        #[arg(value_name = "DIR")]
        build_dir: Utf8PathBuf,
    },
}
