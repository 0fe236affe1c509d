//! Progress reporting, compiled down to nothing without the `progress` feature
//!
//! Callers only build bars through [`bytes_bar`] and [`spinner`], so the
//! disabled stand-in needs no styling API.

#[cfg(feature = "progress")]
pub use indicatif::ProgressBar;

#[cfg(not(feature = "progress"))]
pub use self::disabled::ProgressBar;

/// Byte-counting bar for reading `total` bytes of sources
#[cfg(feature = "progress")]
pub fn bytes_bar(total: u64, message: &'static str) -> ProgressBar {
    use indicatif::ProgressStyle;

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({binary_bytes_per_sec}) {msg}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░  "));
    }
    pb.set_message(message);
    pb
}

/// Ticking spinner for phases with no measurable progress
#[cfg(feature = "progress")]
pub fn spinner(message: &'static str) -> ProgressBar {
    use indicatif::ProgressStyle;
    use std::time::Duration;

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[cfg(not(feature = "progress"))]
pub fn bytes_bar(_total: u64, _message: &'static str) -> ProgressBar {
    ProgressBar
}

#[cfg(not(feature = "progress"))]
pub fn spinner(_message: &'static str) -> ProgressBar {
    ProgressBar
}

#[cfg(not(feature = "progress"))]
mod disabled {
    use std::borrow::Cow;

    /// Swallows every update
    #[derive(Debug, Clone, Default)]
    pub struct ProgressBar;

    impl ProgressBar {
        pub fn inc(&self, _delta: u64) {}
        pub fn finish_with_message(&self, _msg: impl Into<Cow<'static, str>>) {}
    }
}
