//! Heuristic failure diagnosis. Pure lookups over a fixed substring
//! table; both entry points are total and never fail, whatever the input.

pub struct ErrorAnalysis {
    pub category: String,
    pub explanation: String,
    pub suggestions: Vec<String>,
}

struct Pattern {
    needle: &'static str,
    category: &'static str,
    explanation: &'static str,
    suggestions: &'static [&'static str],
}

const PATTERNS: &[Pattern] = &[
    Pattern {
        needle: "no module named",
        category: "MISSING_MODULE",
        explanation: "A required module is not installed in the environment.",
        suggestions: &[
            "Install the missing module with your package manager",
            "Check the module name for typos",
            "Verify the interpreter is using the expected environment",
        ],
    },
    Pattern {
        needle: "nameerror",
        category: "UNDEFINED_NAME",
        explanation: "The script references a variable or function that is not defined.",
        suggestions: &[
            "Check the identifier for typos",
            "Make sure the name is defined before it is used",
        ],
    },
    Pattern {
        needle: "syntaxerror",
        category: "SYNTAX",
        explanation: "The interpreter rejected the source before running it.",
        suggestions: &[
            "Inspect the line reported by the interpreter",
            "Look for unbalanced brackets or quotes",
        ],
    },
    Pattern {
        needle: "indentationerror",
        category: "SYNTAX",
        explanation: "Inconsistent indentation confused the interpreter.",
        suggestions: &[
            "Use a single indentation style (spaces or tabs, not both)",
        ],
    },
    Pattern {
        needle: "permission denied",
        category: "PERMISSION",
        explanation: "The process was denied access to a file or resource.",
        suggestions: &[
            "Check file ownership and mode bits",
            "Verify the working directory is writable",
        ],
    },
    Pattern {
        needle: "connection refused",
        category: "NETWORK",
        explanation: "The remote endpoint is not accepting connections.",
        suggestions: &[
            "Confirm the target service is running",
            "Check the host and port",
        ],
    },
    Pattern {
        needle: "connection timed out",
        category: "NETWORK",
        explanation: "The remote endpoint did not answer in time.",
        suggestions: &[
            "Check network connectivity",
            "Retry once the remote host is reachable",
        ],
    },
    Pattern {
        needle: "command not found",
        category: "NOT_FOUND",
        explanation: "The requested program is not on the search path.",
        suggestions: &[
            "Check the command name for typos",
            "Install the program or add its directory to PATH",
        ],
    },
    Pattern {
        needle: "no such file or directory",
        category: "NOT_FOUND",
        explanation: "A referenced file or directory does not exist.",
        suggestions: &[
            "Check the path for typos",
            "Verify the file exists in the working directory",
        ],
    },
    Pattern {
        needle: "out of memory",
        category: "RESOURCE",
        explanation: "The process exhausted available memory.",
        suggestions: &[
            "Reduce the input size",
            "Close other memory-heavy processes",
        ],
    },
];

const GENERIC_EXPLANATION: &str =
    "No known failure pattern matched. Check the full error output above.";

fn find(message: &str) -> Option<&'static Pattern> {
    let lowered = message.to_lowercase();
    PATTERNS.iter().find(|p| lowered.contains(p.needle))
}

pub fn analyze(message: &str) -> ErrorAnalysis {
    match find(message) {
        Some(p) => ErrorAnalysis {
            category: p.category.to_string(),
            explanation: p.explanation.to_string(),
            suggestions: p.suggestions.iter().map(|s| s.to_string()).collect(),
        },
        None => ErrorAnalysis {
            category: "UNKNOWN".to_string(),
            explanation: GENERIC_EXPLANATION.to_string(),
            suggestions: Vec::new(),
        },
    }
}

pub fn suggest_solutions(message: &str) -> Vec<String> {
    find(message)
        .map(|p| p.suggestions.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pattern() {
        let analysis = analyze("ModuleNotFoundError: No module named 'requests'");
        assert_eq!(analysis.category, "MISSING_MODULE");
        assert!(!analysis.suggestions.is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let analysis = analyze("PERMISSION DENIED: /etc/shadow");
        assert_eq!(analysis.category, "PERMISSION");
    }

    #[test]
    fn test_total_on_garbage() {
        for input in ["", "   ", "zzz 123 \u{1b}[31m!!", "\0\0"] {
            let analysis = analyze(input);
            assert_eq!(analysis.category, "UNKNOWN");
            assert!(analysis.suggestions.is_empty());
            assert!(suggest_solutions(input).is_empty());
        }
    }

    #[test]
    fn test_suggestions_match_analysis() {
        let msg = "sh: 1: frobnicate: command not found";
        assert_eq!(suggest_solutions(msg), analyze(msg).suggestions);
    }
}
