use clap::Parser;

const AFTER_HELP: &str = "Examples:
  amem-install
  amem-install --version=v1.2.0 --dir=~/bin
  amem-install --profile=server --dry-run

Environment:
  AGENTRA_INSTALL_PROFILE   default profile when --profile is not given
  AGENTRA_INSTALL_VERBOSE   set to 1 to show logs instead of the progress bar
  GITHUB_TOKEN              token used for GitHub API requests
  RUST_LOG                  log filter override";

#[derive(Parser, Debug)]
#[command(name = "amem-install")]
#[command(about = "Install the agentic-memory CLI and MCP server")]
#[command(disable_version_flag = true, after_help = AFTER_HELP)]
pub struct Cli {
    /// Release tag to install (e.g. 'v1.2.0'); defaults to the latest release
    #[arg(long, value_name = "X.Y.Z")]
    pub version: Option<String>,

    /// Install directory (default: ~/.local/bin)
    #[arg(long, value_name = "PATH")]
    pub dir: Option<String>,

    /// Install profile: desktop, terminal or server
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Print what would be done without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Show log output instead of the progress bar
    #[arg(long)]
    pub verbose: bool,
}

const VALUE_FLAGS: &[&str] = &["--version", "--dir", "--profile"];
const SWITCH_FLAGS: &[&str] = &["--dry-run", "--verbose", "--help", "-h"];

/// Splits raw arguments into those clap understands and those it would reject.
/// The first element (program name) is always kept.
pub fn split_known_args<I>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut known = Vec::new();
    let mut unknown = Vec::new();
    let mut args = args.into_iter();

    if let Some(program) = args.next() {
        known.push(program);
    }

    while let Some(arg) = args.next() {
        let flag = arg.split_once('=').map_or(arg.as_str(), |(flag, _)| flag);

        if VALUE_FLAGS.contains(&flag) {
            let has_inline_value = arg.contains('=');
            known.push(arg);
            if !has_inline_value {
                if let Some(value) = args.next() {
                    known.push(value);
                }
            }
        } else if SWITCH_FLAGS.contains(&arg.as_str()) {
            known.push(arg);
        } else {
            unknown.push(arg);
        }
    }

    (known, unknown)
}
