//! Constants shared across the system

/// Worker pool limits
pub mod workers {
    /// Default worker count never exceeds this, even on large machines
    pub const DEFAULT_CAP: usize = 8;

    /// Requested worker counts are clamped to `available cores * MAX_FACTOR`
    pub const MAX_FACTOR: usize = 2;
}

/// Output naming limits
pub mod naming {
    /// Row field used for output names when none is configured
    pub const DEFAULT_FILENAME_FIELD: &str = "filename";

    /// Maximum length of a sanitized base name, in characters
    pub const MAX_STEM_CHARS: usize = 120;

    /// Upper bound for `name (k)` disambiguation attempts against existing files
    pub const MAX_DISAMBIGUATION_ATTEMPTS: usize = 10_000;
}

/// PDF converter defaults
pub mod pdf {
    /// Page margins in millimetres: top, right, bottom, left
    pub const DEFAULT_MARGINS_MM: [u32; 4] = [15, 15, 15, 15];

    /// Per-call converter timeout
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Environment variable naming an explicit wkhtmltopdf binary
    pub const BINARY_ENV: &str = "LETTERGEN_WKHTMLTOPDF";
}
