//! Canonicalization of ASCII-armored blocks.
//!
//! Some signing tools add armor header lines such as `Version: ...` or `Comment: ...` between the
//! `-----BEGIN ...-----` line and the encoded body. Verifiers that compare or strictly parse armor
//! reject those, so signatures are canonicalized before they are sent or verified.

/// Prefixes of armor header lines that are removed by [`canonicalize_armor`]
pub const STRIPPED_HEADER_PREFIXES: &[&str] =
    &["Version:", "Comment:", "Hash:", "Charset:", "MessageID:"];

/// Canonicalize an ASCII-armored block.
///
/// - CRLF line endings become LF
/// - header lines starting with one of [`STRIPPED_HEADER_PREFIXES`] directly after a
///   `-----BEGIN` line are removed
/// - OpenPGP blocks (`-----BEGIN PGP ...`) keep exactly one blank line between the header lines
///   and the body, even when no headers remain; other blocks lose the separator along with the
///   stripped headers
/// - trailing whitespace on each line and leading and trailing blank lines are removed
/// - the result ends with exactly one newline
///
/// This is idempotent.
pub fn canonicalize_armor(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut state = State::Body;

    for line in text.lines() {
        let line = line.trim_end();

        match state {
            State::Headers { stripped_any } => {
                if is_stripped_header(line) {
                    state = State::Headers { stripped_any: true };
                    continue;
                }
                state = State::Body;
                if line.is_empty() && stripped_any {
                    continue;
                }
            }
            State::PgpHeaders => {
                if is_stripped_header(line) {
                    continue;
                }
                if is_header(line) {
                    out.push(line);
                    continue;
                }
                state = State::Body;
                out.push("");
                if line.is_empty() {
                    continue;
                }
            }
            State::Body => {}
        }

        if line.starts_with("-----BEGIN PGP ") {
            state = State::PgpHeaders;
        } else if line.starts_with("-----BEGIN ") {
            state = State::Headers {
                stripped_any: false,
            };
        }
        out.push(line);
    }

    let start = out.iter().position(|l| !l.is_empty()).unwrap_or(out.len());
    let end = out.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);

    let mut result = out[start..end].join("\n");
    result.push('\n');
    result
}

/// Where [`canonicalize_armor`] is within the current block
#[derive(Clone, Copy)]
enum State {
    /// Just after the `BEGIN` line of a non-OpenPGP block
    Headers { stripped_any: bool },
    /// Just after the `BEGIN` line of an OpenPGP block, before the blank separator
    PgpHeaders,
    Body,
}

/// Armor header lines are `Key: Value`; the radix-64 body never contains a colon.
fn is_header(line: &str) -> bool {
    line.contains(':') && !line.starts_with("-----")
}

fn is_stripped_header(line: &str) -> bool {
    STRIPPED_HEADER_PREFIXES.iter().any(|p| line.starts_with(p))
}
