pub const PROMPT: &str = "> ";

pub fn banner_lines(api_base_url: &str) -> Vec<String> {
    vec![
        "Document Q&A".to_string(),
        format!("Backend: {api_base_url}"),
        "Type a question and press Enter, or /help for commands.".to_string(),
    ]
}

pub fn help_lines() -> Vec<String> {
    const COMMANDS: &[(&str, &str)] = &[
        ("TEXT", "ask a question on the current page"),
        ("/send", "send the composer (e.g. dictated text)"),
        ("/new", "start a new page"),
        ("/pages", "list pages"),
        ("/open N", "switch to page N"),
        ("/delete [N]", "delete page N, or the current page"),
        ("/rename TITLE", "rename the current page"),
        ("/context N", "show or hide the context of answer N"),
        ("/add PATH...", "stage files (.docx, .pdf, .csv, .txt)"),
        ("/remove N", "unstage file N"),
        ("/clear", "unstage all files"),
        ("/files", "list staged files"),
        ("/upload", "upload staged files"),
        ("/health", "check the backend"),
        ("/voice", "start or stop voice input"),
        ("/quit", "exit"),
    ];
    let width = COMMANDS.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut lines = vec!["Commands:".to_string()];
    lines.extend(
        COMMANDS
            .iter()
            .map(|(name, about)| format!("  {name:<width$}  {about}")),
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_every_command_aligned() {
        let lines = help_lines();
        assert_eq!(lines[0], "Commands:");
        assert!(lines.iter().any(|line| line.starts_with("  /voice ")));
        let column = lines[1].find("ask").unwrap();
        assert!(lines[1..].iter().all(|line| line.len() > column));
        assert_eq!(lines.last().unwrap().find("exit"), Some(column));
    }
}
