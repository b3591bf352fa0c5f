use base64::{engine::general_purpose, Engine as _};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Set up `tracing` on stderr. `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // A second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta})",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Keep the console open until the user presses a key.
///
/// Does nothing when stdin is not a terminal, so piped and scripted runs
/// don't block.
pub fn wait_for_keypress() {
    wait_for_keypress_if(std::io::stdin().is_terminal());
}

/// Returns whether a key was waited for
fn wait_for_keypress_if(interactive: bool) -> bool {
    if !interactive {
        return false;
    }
    let term = Term::stderr();
    let _ = term.write_line(&format!("{}", style("Press any key to terminate !!").dim()));
    if let Err(e) = term.read_key() {
        tracing::debug!("Failed to read key: {}", e);
    }
    true
}

/// Replace `\` with `/`
pub fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Paths handed to the engine use `/` on every platform
pub fn normalize_separators(path: &str) -> String {
    if cfg!(windows) {
        to_forward_slashes(path)
    } else {
        path.to_string()
    }
}

/// Whether `data` decodes as standard (padded) base64
pub fn is_valid_base64(data: &str) -> bool {
    let data = data.trim();
    !data.is_empty() && general_purpose::STANDARD.decode(data).is_ok()
}

/// Print error message
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_to_forward_slashes() {
        assert_eq!(
            to_forward_slashes(r"C:\Projects\micr\assets"),
            "C:/Projects/micr/assets"
        );
        assert_eq!(to_forward_slashes("../assets"), "../assets");
    }

    #[test]
    fn test_normalize_separators() {
        #[cfg(windows)]
        assert_eq!(normalize_separators(r"..\assets"), "../assets");
        #[cfg(not(windows))]
        assert_eq!(normalize_separators(r"dir\with\backslash"), r"dir\with\backslash");
        assert_eq!(normalize_separators("/opt/assets"), "/opt/assets");
    }

    #[test]
    fn test_is_valid_base64() {
        assert!(is_valid_base64("AAECAwQF"));
        assert!(is_valid_base64("dGVzdA=="));
        assert!(is_valid_base64("dGVzdA==\n"));

        assert!(!is_valid_base64(""));
        assert!(!is_valid_base64("dGVzdA"));
        assert!(!is_valid_base64("not base64!"));
    }

    #[test]
    fn test_progress_bar_length() {
        let pb = create_progress_bar(42);
        assert_eq!(pb.length(), Some(42));
    }

    #[test]
    fn test_no_keypress_wait_without_terminal_stdin() {
        assert!(!wait_for_keypress_if(false));
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
