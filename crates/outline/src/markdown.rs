//! Flat Markdown structurer: topics become `##`, subtopics `###`, everything
//! else a `-` bullet. No hierarchy validation, never fails.

use crate::line::{classify, LineKind};

pub fn render_markdown(text: &str, root_title: &str) -> String {
    let mut markdown = format!("# {root_title}\n");
    for line in text.lines().filter_map(classify) {
        let prefix = match line.kind {
            LineKind::Topic => "##",
            LineKind::Subtopic => "###",
            LineKind::Detail => "-",
        };
        markdown.push_str(prefix);
        markdown.push(' ');
        markdown.push_str(&line.title);
        markdown.push('\n');
    }
    markdown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_markup() {
        let md = render_markdown("**A**\n*B*\nC", "Main Topic");
        assert_eq!(md, "# Main Topic\n## A\n### B\n- C\n");
    }

    #[test]
    fn orphans_are_kept_as_is() {
        let md = render_markdown("*orphan*\ndetail", "Root");
        assert_eq!(md, "# Root\n### orphan\n- detail\n");
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(render_markdown("\n\n", "Root"), "# Root\n");
    }
}
