//! Common constants used throughout the kistamp application.

/// Reserved variable: public URL of the project repository
pub const PROJECT_REPO_URL: &str = "PROJECT_REPO_URL";

/// Reserved variable: project name
pub const PROJECT_NAME: &str = "PROJECT_NAME";

/// Reserved variable: project version ("git describe" style)
pub const PROJECT_VERSION: &str = "PROJECT_VERSION";

/// Reserved variable: commit date of the current head
pub const PROJECT_VERSION_DATE: &str = "PROJECT_VERSION_DATE";

/// Reserved variable: date the current build is made
pub const PROJECT_BUILD_DATE: &str = "PROJECT_BUILD_DATE";

/// Reserved variable: path of the file being processed
pub const SOURCE_FILE_PATH: &str = "SOURCE_FILE_PATH";

/// Default strftime format for the version and build dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// File suffix that selects the KiCad filter chain automatically
pub const KICAD_PCB_SUFFIX: &str = ".kicad_pcb";

/// Positional argument value standing for stdin/stdout
pub const STDIO_MARKER: &str = "-";
