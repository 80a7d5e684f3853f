//! Code extraction from model transcripts.

/// Returns the program to execute for a transcript.
///
/// The code is everything after the last occurrence of `open_marker`. When
/// the marker never occurs the whole transcript is treated as code. A tools
/// script, when present, is prepended with a single newline so its
/// definitions are in scope for the extracted block. The slice is taken
/// byte-for-byte: no trimming, no normalization.
pub fn extract_code(transcript: &str, open_marker: &str, tools_script: Option<&str>) -> String {
    let code = match transcript.rfind(open_marker) {
        Some(idx) => &transcript[idx + open_marker.len()..],
        None => transcript,
    };

    match tools_script {
        Some(script) => format!("{}\n{}", script, code),
        None => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_code_after_last_marker() {
        let transcript = "<code>first()</code><output>1</output>and now<code>second()";
        assert_eq!(extract_code(transcript, "<code>", None), "second()");
    }

    #[test]
    fn missing_marker_returns_whole_transcript() {
        let transcript = "no markers here at all";
        assert_eq!(extract_code(transcript, "<code>", None), transcript);
    }

    #[test]
    fn prepends_tools_script_with_single_newline() {
        let transcript = "question<code>run()";
        assert_eq!(
            extract_code(transcript, "<code>", Some("def helper(): pass")),
            "def helper(): pass\nrun()"
        );
    }

    #[test]
    fn tools_script_applies_without_marker_too() {
        assert_eq!(
            extract_code("print(1)", "<code>", Some("x = 1")),
            "x = 1\nprint(1)"
        );
    }

    #[test]
    fn trailing_marker_yields_empty_code() {
        assert_eq!(extract_code("text<code>", "<code>", None), "");
    }

    #[test]
    fn code_is_not_trimmed() {
        assert_eq!(
            extract_code("ask<code>\n  spaced()\n", "<code>", None),
            "\n  spaced()\n"
        );
    }
}
