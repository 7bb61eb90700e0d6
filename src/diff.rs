use colored::Colorize;
use prettydiff::{basic::DiffOp, diff_lines};

/// How many lines of context are displayed around the actual diffs
const CONTEXT: usize = 2;

fn skip(skipped_lines: &[&str]) {
    // When the amount of skipped lines is exactly `CONTEXT * 2`, we already
    // print all the context and don't actually skip anything.
    match skipped_lines.len().checked_sub(CONTEXT * 2) {
        Some(skipped @ 2..) => {
            for line in &skipped_lines[..CONTEXT] {
                eprintln!(" {line}");
            }
            eprintln!("... {skipped} lines skipped ...");
            for line in &skipped_lines[skipped + CONTEXT..] {
                eprintln!(" {line}");
            }
        }
        _ => {
            for line in skipped_lines {
                eprintln!(" {line}");
            }
        }
    }
}

/// Print a colored line diff between the expected and the actual output.
pub fn print_diff(expected: &[u8], actual: &[u8]) {
    let expected_str = String::from_utf8_lossy(expected);
    let actual_str = String::from_utf8_lossy(actual);

    if expected_str.as_bytes() != expected || actual_str.as_bytes() != actual {
        eprintln!(
            "{}",
            "Non-UTF8 characters in output, diff may be imprecise.".red()
        );
    }

    // Make non-printable whitespace visible so differences in it show up.
    let pat = |c: char| c.is_whitespace() && c != ' ' && c != '\n' && c != '\r';
    let expected_str = expected_str.replace(pat, "░");
    let actual_str = actual_str.replace(pat, "░");

    for row in diff_lines(&expected_str, &actual_str).diff() {
        match row {
            DiffOp::Equal(lines) => skip(lines),
            DiffOp::Remove(lines) => {
                for line in lines {
                    eprintln!("{}{}", "-".red(), line.red());
                }
            }
            DiffOp::Insert(lines) => {
                for line in lines {
                    eprintln!("{}{}", "+".green(), line.green());
                }
            }
            DiffOp::Replace(old, new) => {
                for line in old {
                    eprintln!("{}{}", "-".red(), line.red());
                }
                for line in new {
                    eprintln!("{}{}", "+".green(), line.green());
                }
            }
        }
    }
    eprintln!();
}
