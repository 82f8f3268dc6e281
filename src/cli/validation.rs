use crate::cli::args::CliArgs;
use crate::output::OutputFormat;
use crate::state::TimeWindow;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.source.as_deref() {
        crate::runner::SourceKind::parse(raw)
            .ok_or_else(|| format!("invalid --source '{raw}', expected quran or videos"))?;
    }
    if let Some(raw) = args.window.as_deref() {
        raw.parse::<TimeWindow>()
            .map_err(|e| format!("invalid --window '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json or html"
            ));
        }
    }
    if let Some(page) = args.page {
        crate::utils::parse_positive(page, "page")?;
    }
    if let Some(page_size) = args.page_size {
        crate::utils::parse_positive(page_size, "page-size")?;
    }
    if let Some(raw) = args.ayah.as_deref() {
        crate::utils::parse_verse_ref(raw).map_err(|e| format!("invalid --ayah '{raw}': {e}"))?;
    }
    if args.ayah.is_some() && args.open.is_some() {
        return Err("use either --open or --ayah, not both".to_string());
    }
    if let Some(raw) = args.keywords.as_deref() {
        crate::utils::parse_keywords_csv(raw)
            .map_err(|e| format!("invalid --keywords '{raw}': {e}"))?;
    }
    if let Some(max) = args.max_results {
        if !(1..=50).contains(&max) {
            return Err("invalid max-results, expected 1-50".to_string());
        }
    }
    if let Some(0) = args.refresh_interval {
        return Err("invalid refresh-interval, expected positive integer".to_string());
    }
    if let Some(0) = args.timeout {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    if args.auto_refresh && !args.watch {
        return Err("--auto-refresh requires --watch".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["ngaji"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn accepts_defaults() {
        assert!(validate(&parse(&[])).is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(validate(&parse(&["--source", "radio"])).is_err());
        assert!(validate(&parse(&["--window", "year"])).is_err());
        assert!(validate(&parse(&["--page", "0"])).is_err());
        assert!(validate(&parse(&["--ayah", "2"])).is_err());
        assert!(validate(&parse(&["--max-results", "80"])).is_err());
        assert!(validate(&parse(&["--output-format", "xml"])).is_err());
        assert!(validate(&parse(&["--auto-refresh"])).is_err());
    }

    #[test]
    fn open_and_ayah_are_exclusive() {
        assert!(validate(&parse(&["--open", "2", "--ayah", "2:255"])).is_err());
        assert!(validate(&parse(&["--ayah", "2:255"])).is_ok());
    }
}
