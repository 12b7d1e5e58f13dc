const fn build_version_or_cargo(opt: Option<&'static str>) -> &'static str {
    match opt {
        Some(val) => val,
        None => env!("CARGO_PKG_VERSION"),
    }
}

/// Release tag injected by the container build, falling back to the crate version.
pub const VERSION: &str = build_version_or_cargo(option_env!("STRUCTURE_API_VERSION"));
