// src/table/xlsx.rs
//
// Minimal reader for the first worksheet of an .xlsx workbook: values only,
// no styles or formulas.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};
use tracing::{debug, instrument};
use zip::{result::ZipError, ZipArchive};

use super::RawTable;

static SHARED_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<si\b[^>]*?(?:/>|>(.*?)</si>)").expect("valid regex"));
static TEXT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<t(?:\s[^>]*)?>(.*?)</t>").expect("valid regex"));
static PHONETIC_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<rPh\b.*?</rPh>").expect("valid regex"));
static ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<row\b[^>]*?(?:/>|>(.*?)</row>)").expect("valid regex"));
static CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<c\b([^>]*?)(?:/>|>(.*?)</c>)").expect("valid regex"));
static CELL_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\br="([A-Z]+)[0-9]+""#).expect("valid regex"));
static CELL_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bt="([^"]*)""#).expect("valid regex"));
static VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<v>(.*?)</v>").expect("valid regex"));
static SHEET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^xl/worksheets/sheet([0-9]+)\.xml$").expect("valid regex"));
static SHEET_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<sheet\b([^>]*?)/?>").expect("valid regex"));
static RELATIONSHIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<Relationship\b([^>]*?)/?>").expect("valid regex"));
static ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_][\w.:-]*)\s*=\s*"([^"]*)""#).expect("valid regex"));

/// Excel's last column, `XFD`.
const MAX_COLUMNS: usize = 16_384;

#[instrument(level = "debug", fields(path = %path.display()))]
pub fn read_first_sheet(path: &Path) -> Result<RawTable> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_workbook(file).with_context(|| format!("reading workbook {}", path.display()))
}

pub fn read_workbook<R: Read + Seek>(reader: R) -> Result<RawTable> {
    let mut archive = ZipArchive::new(reader).context("not a zip container")?;

    let sheet_name = match first_tab(&mut archive)? {
        Some(name) => name,
        None => lowest_numbered_sheet(&archive).context("workbook has no worksheets")?,
    };

    let shared = match read_entry(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml),
        None => Vec::new(),
    };
    let sheet = read_entry(&mut archive, &sheet_name)?
        .with_context(|| format!("missing {sheet_name}"))?;
    debug!(sheet = %sheet_name, shared = shared.len(), "workbook opened");

    Ok(parse_sheet(&sheet, &shared))
}

/// Part name of the first tab listed in `xl/workbook.xml`, resolved through the
/// workbook relationships. `None` when either part is missing or the target
/// does not exist in the archive.
fn first_tab<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Option<String>> {
    let Some(workbook) = read_entry(archive, "xl/workbook.xml")? else {
        return Ok(None);
    };
    let Some(rels) = read_entry(archive, "xl/_rels/workbook.xml.rels")? else {
        return Ok(None);
    };

    let rel_id = SHEET_ENTRY
        .captures(&workbook)
        .and_then(|c| attr(&c[1], "r:id"));
    let Some(rel_id) = rel_id else {
        return Ok(None);
    };

    let target = RELATIONSHIP
        .captures_iter(&rels)
        .find(|c| attr(&c[1], "Id").as_deref() == Some(rel_id.as_str()))
        .and_then(|c| attr(&c[1], "Target"));
    let part = target.map(|t| match t.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{t}"),
    });

    Ok(part.filter(|p| archive.file_names().any(|n| n == p)))
}

fn lowest_numbered_sheet<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<String> {
    archive
        .file_names()
        .filter_map(|n| {
            SHEET_NAME
                .captures(n)
                .and_then(|c| c[1].parse::<u32>().ok())
                .map(|idx| (idx, n.to_string()))
        })
        .min()
        .map(|(_, n)| n)
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    ATTR.captures_iter(attrs)
        .find(|c| &c[1] == name)
        .map(|c| unescape_xml(&c[2]))
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    match archive.by_name(name) {
        Ok(mut entry) => {
            let mut buf = String::with_capacity(entry.size() as usize);
            entry
                .read_to_string(&mut buf)
                .with_context(|| format!("reading {name}"))?;
            Ok(Some(buf))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("opening {name}")),
    }
}

fn parse_shared_strings(xml: &str) -> Vec<String> {
    SHARED_STRING
        .captures_iter(xml)
        .map(|c| c.get(1).map(|m| concat_text_runs(m.as_str())).unwrap_or_default())
        .collect()
}

/// Visible text of a rich-text fragment; phonetic hints are not part of it.
fn concat_text_runs(fragment: &str) -> String {
    let visible = PHONETIC_RUN.replace_all(fragment, "");
    TEXT_RUN
        .captures_iter(&visible)
        .map(|c| unescape_xml(&c[1]))
        .collect()
}

/// First non-empty row is the header; fully blank rows are dropped.
fn parse_sheet(xml: &str, shared: &[String]) -> RawTable {
    let mut rows = ROW
        .captures_iter(xml)
        .map(|c| c.get(1).map(|m| parse_row(m.as_str(), shared)).unwrap_or_default())
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()));

    let headers: Vec<String> = rows
        .next()
        .map(|h| h.into_iter().map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();
    let width = headers.len();
    let rows = rows
        .map(|mut r| {
            r.resize(width.max(r.len()), String::new());
            r
        })
        .collect();

    RawTable { headers, rows }
}

/// Cells whose reference lies beyond the last Excel column are dropped.
fn parse_row(xml: &str, shared: &[String]) -> Vec<String> {
    let mut cells: Vec<String> = Vec::new();
    for cap in CELL.captures_iter(xml) {
        let attrs = &cap[1];
        let body = cap.get(2).map(|m| m.as_str()).unwrap_or("");
        let col = match CELL_REF.captures(attrs) {
            Some(c) => match column_index(&c[1]) {
                Some(col) => col,
                None => {
                    debug!(reference = &c[1], "cell outside sheet bounds skipped");
                    continue;
                }
            },
            None => cells.len(),
        };
        if col >= MAX_COLUMNS {
            continue;
        }
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = cell_value(attrs, body, shared);
    }
    cells
}

fn cell_value(attrs: &str, body: &str, shared: &[String]) -> String {
    let kind = CELL_TYPE
        .captures(attrs)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    let raw = VALUE.captures(body).map(|c| unescape_xml(&c[1]));

    match kind.as_str() {
        "s" => raw
            .and_then(|i| i.trim().parse::<usize>().ok())
            .and_then(|i| shared.get(i).cloned())
            .unwrap_or_default(),
        "inlineStr" => concat_text_runs(body),
        "b" => match raw.as_deref() {
            Some("1") => "True".to_string(),
            Some("0") => "False".to_string(),
            _ => String::new(),
        },
        "" | "n" => raw.map(|v| shortest_number(&v)).unwrap_or_default(),
        _ => raw.unwrap_or_default(),
    }
}

/// Numeric cells hold the full binary expansion (`1234.5599999999999`); render
/// the shortest decimal that parses back to the same `f64`.
fn shortest_number(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => format!("{n}"),
        _ => raw.to_string(),
    }
}

/// `A` → 0, `Z` → 25, `AA` → 26. `None` past `XFD`.
fn column_index(letters: &str) -> Option<usize> {
    let n = letters.bytes().try_fold(0usize, |acc, b| {
        if !b.is_ascii_uppercase() {
            return None;
        }
        acc.checked_mul(26)?.checked_add((b - b'A' + 1) as usize)
    })?;
    (1..=MAX_COLUMNS).contains(&n).then(|| n - 1)
}

fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            e if e.starts_with("#x") => {
                u32::from_str_radix(&e[2..], 16).ok().and_then(char::from_u32)
            }
            e if e.starts_with('#') => e[1..].parse().ok().and_then(char::from_u32),
            _ => None,
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..=semi]),
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}
