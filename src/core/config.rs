//! Installation configuration

use std::path::PathBuf;

const DEFAULT_BIN_DIR: &str = "/opt/millepede/bin";
const DEFAULT_TEMPLATE_DIR: &str = "/opt/millepede/txt";

/// Locations of the Millepede tool suite, fixed per installation.
///
/// `MILLEPEDE_BIN_DIR` and `MILLEPEDE_TXT_DIR` set when this crate is built
/// override the defaults, mirroring the configure-time substitution the tool
/// suite itself is installed with. Nothing here is a runtime option: the
/// binaries and the steering templates belong to the same installation and
/// must not drift apart between runs.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Directory holding 1convert, 3fixanotherlayers, 5.1PedetoDB_ss
    /// and 5.2add_param
    pub bin_dir: PathBuf,

    /// Directory holding the pede steering templates (`*.txt`)
    pub template_dir: PathBuf,

    /// Program name of the Millepede-II minimizer, resolved through PATH
    pub pede_program: PathBuf,
}

impl ChainConfig {
    /// Configuration baked in at build time
    pub fn from_build_env() -> Self {
        Self {
            bin_dir: PathBuf::from(option_env!("MILLEPEDE_BIN_DIR").unwrap_or(DEFAULT_BIN_DIR)),
            template_dir: PathBuf::from(
                option_env!("MILLEPEDE_TXT_DIR").unwrap_or(DEFAULT_TEMPLATE_DIR),
            ),
            pede_program: PathBuf::from("pede"),
        }
    }

    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = dir.into();
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    pub fn with_pede_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.pede_program = program.into();
        self
    }

    /// Absolute path of a tool in the binary directory
    pub fn tool(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::from_build_env()
    }
}
