//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// rcm-manager - manage RCM payload downloads and injection for Tegra
/// devices.
#[derive(Parser, Debug)]
#[command(name = "rcm-manager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Use a specific configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan once and report the device status.
    Status,

    /// List all attached USB devices.
    Devices,

    /// Monitor the device continuously, printing every status change.
    Watch,

    /// List catalog releases with their local cache state.
    Releases,

    /// Download a release's payload into the cache.
    Download {
        /// Release tag (or title) to download.
        tag: Option<String>,

        /// Download the newest release.
        #[arg(long, conflicts_with = "tag")]
        latest: bool,

        /// Download every release payload missing from the cache.
        #[arg(long, conflicts_with_all = ["tag", "latest"])]
        all: bool,
    },

    /// Show or change the payload selection.
    Select {
        /// Select a payload file by path.
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Select a downloaded release payload by tag.
        #[arg(long, conflicts_with = "payload")]
        release: Option<String>,

        /// Clear the current selection.
        #[arg(long, conflicts_with_all = ["payload", "release"])]
        clear: bool,
    },

    /// Inject the selected payload into a device in RCM.
    Inject {
        /// Inject this payload instead of the stored selection
        /// (also replaces the stored selection).
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Keep polling until an RCM device appears, then inject.
        #[arg(long)]
        wait: bool,
    },

    /// Show the data, store and payload cache paths being used.
    Paths,
}
