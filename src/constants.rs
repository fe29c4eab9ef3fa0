//! Central constants for the resolvr application

/// Default values for configuration
pub mod config {
    /// Default configuration file name
    pub const DEFAULT_CONFIG_FILE: &str = "resolvr.yaml";

    /// Default number of jobs run at the same time
    pub const DEFAULT_WORKERS: usize = 4;

    /// Default deadline for a whole scheduling run, in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60 * 60;

    /// Exclusion globs applied when the user does not provide any
    pub const DEFAULT_EXCLUSIONS: &[&str] = &[
        "**/node_modules/**",
        "**/bower_components/**",
        "**/vendor/**",
        "**/.git/**",
        "**/obj/**",
    ];
}

/// Values shared by every job
pub mod job {
    /// Message recorded when a job runs out of time, whether or not its process started
    pub const TIMEOUT_MESSAGE: &str = "Timeout reached. Terminating job";

    /// Grace period given to an interrupted process before it is killed, in seconds
    pub const INTERRUPT_GRACE_SECS: u64 = 5;
}

/// Lock files written next to the manifests
pub mod lock {
    pub const MAVEN: &str = "maven.resolvr.lock";
    pub const GRADLE: &str = "gradle.resolvr.lock";
    pub const GOMOD: &str = "gomod.resolvr.lock";
    /// Pip lock files are named `.<requirements file name>` + this suffix
    pub const PIP_SUFFIX: &str = ".pip.resolvr.lock";
}

/// Gradle helper names
pub mod gradle {
    /// Task injected by the init script that writes the dependency tree
    pub const DEPENDENCIES_TASK: &str = "resolvrAllDeps";

    /// Task injected by the init script that lists subproject directories
    pub const PROJECT_PATHS_TASK: &str = "resolvrFindSubProjectPaths";

    /// File written by [`PROJECT_PATHS_TASK`] in the settings directory
    pub const PROJECT_PATHS_FILE: &str = ".gradle.resolvr.project_paths.txt";

    /// Init script file name inside the temporary directory
    pub const INIT_SCRIPT_FILE: &str = "resolvr-init.gradle";
}

/// Call graph output names
pub mod callgraph {
    /// Raw output written by the call graph tools
    pub const OUTPUT_FILE: &str = ".resolvr-call-graph";

    /// Entry name of the raw output inside the archive
    pub const ARCHIVE_ENTRY: &str = "call-graph";

    /// Directory receiving the copied Maven dependencies of a Java root
    pub const MAVEN_DEPENDENCY_DIR: &str = ".resolvrTmpFolder";

    /// Java major versions a Soot wrapper jar is published for
    pub const SUPPORTED_JAVA_VERSIONS: &[u32] = &[11, 17, 21];
}
