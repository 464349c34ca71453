/// Release builds may stamp `NRBACKUP_VERSION`; otherwise the crate version.
pub const VERSION: &str = match option_env!("NRBACKUP_VERSION") {
    Some(stamped) => stamped,
    None => env!("CARGO_PKG_VERSION"),
};
