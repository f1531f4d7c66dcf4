//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::context::AutostartVariant;

/// kioskctl - kiosk host provisioning orchestrator
///
/// Turns a bare Linux machine into a configured kiosk host running a
/// long-lived GUI application, with verification and an operator report.
#[derive(Parser, Debug)]
#[command(
    name = "kioskctl",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Kiosk host provisioning orchestrator",
    long_about = "kioskctl provisions a bare machine into a kiosk host: it resolves the \
                  latest release for the target architecture, installs it via the package \
                  or manual strategy, writes the session and auto-start glue, grants the \
                  privileged-port capability and verifies the result.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  sudo kioskctl provision acme/helloscreen\n    \
                  sudo kioskctl provision acme/helloscreen --autostart service\n    \
                  sudo kioskctl provision --source-dir ~/helloscreen --product helloscreen\n    \
                  kioskctl verify helloscreen --user kiosk"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision this machine as a kiosk host
    Provision(ProvisionArgs),

    /// Re-run the verification checks and print the report
    Verify(VerifyArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the provision command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Provision from the latest release:\n    sudo kioskctl provision acme/helloscreen\n\n\
                  Supervised-service auto-start:\n    sudo kioskctl provision acme/helloscreen --autostart service\n\n\
                  Provision from a local checkout (no release query):\n    sudo kioskctl provision --source-dir ~/helloscreen --product helloscreen\n\n\
                  Override the platform identifier:\n    sudo kioskctl provision acme/helloscreen --platform-id aarch64")]
pub struct ProvisionArgs {
    /// Release source as owner/repo. When omitted, no release is queried and
    /// installation uses local artifacts from --source-dir only
    pub repo: Option<String>,

    /// Product name (defaults to the repository name)
    #[arg(long, required_unless_present = "repo")]
    pub product: Option<String>,

    /// Installation root (defaults to /opt/<product>)
    #[arg(long, value_name = "DIR")]
    pub install_root: Option<PathBuf>,

    /// Acting (non-root) identity when SUDO_USER is not set
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,

    /// Auto-start mechanism
    #[arg(long, value_enum, default_value_t = AutostartVariant::Profile)]
    pub autostart: AutostartVariant,

    /// X display number for the kiosk session
    #[arg(long, default_value_t = 0)]
    pub display: u32,

    /// Virtual terminal for the profile auto-start variant
    #[arg(long, default_value_t = 1)]
    pub vt: u32,

    /// Directory probed for package artifacts and manual-install sources
    /// (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Raw platform identifier override (defaults to the local machine)
    #[arg(long, value_name = "ID")]
    pub platform_id: Option<String>,
}

/// Installation strategy selector for verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Package,
    Manual,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Verify a provisioned host:\n    kioskctl verify helloscreen --user kiosk\n\n\
                  Force the strategy-specific checks:\n    kioskctl verify helloscreen --user kiosk --strategy manual\n\n\
                  Verify a service-variant install:\n    kioskctl verify helloscreen --user kiosk --autostart service")]
pub struct VerifyArgs {
    /// Product name
    pub product: String,

    /// Kiosk session user
    #[arg(long, value_name = "NAME")]
    pub user: String,

    /// Installation root (defaults to /opt/<product>)
    #[arg(long, value_name = "DIR")]
    pub install_root: Option<PathBuf>,

    /// Installation strategy to check (auto-detected when omitted)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Auto-start mechanism the host was provisioned with
    #[arg(long, value_enum, default_value_t = AutostartVariant::Profile)]
    pub autostart: AutostartVariant,

    /// X display number
    #[arg(long, default_value_t = 0)]
    pub display: u32,

    /// Virtual terminal of the profile auto-start variant
    #[arg(long, default_value_t = 1)]
    pub vt: u32,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    kioskctl completions --shell bash > /etc/bash_completion.d/kioskctl\n\n\
                  Generate zsh completions:\n    kioskctl completions --shell zsh > ~/.zfunc/_kioskctl")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}
