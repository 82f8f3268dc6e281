use std::collections::HashSet;

/// Parses `surah:ayah` such as `2:255`.
pub fn parse_verse_ref(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (surah, ayah) = trimmed
        .split_once(':')
        .ok_or_else(|| "expected format SURAH:AYAH".to_string())?;
    let surah: u32 = surah
        .trim()
        .parse()
        .map_err(|_| "invalid SURAH value".to_string())?;
    let ayah: u32 = ayah
        .trim()
        .parse()
        .map_err(|_| "invalid AYAH value".to_string())?;
    if !(1..=114).contains(&surah) {
        return Err("SURAH must be between 1 and 114".to_string());
    }
    if ayah == 0 {
        return Err("AYAH must be positive".to_string());
    }
    Ok((surah, ayah))
}

pub fn parse_keywords_csv(value: &str) -> Result<Vec<String>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("keyword list is empty".to_string());
    }
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let key = item.to_lowercase();
        if seen.insert(key.clone()) {
            out.push(key);
        }
    }
    if out.is_empty() {
        return Err("keyword list is empty".to_string());
    }
    Ok(out)
}

pub fn parse_positive(value: usize, what: &str) -> Result<usize, String> {
    if value == 0 {
        return Err(format!("invalid {what}, expected positive integer"));
    }
    Ok(value)
}
