//! Markdown rendering and file naming for published solutions.

use crate::contract::{Configuration, SolutionRecord};

const DEFAULT_COMPLEXITY: &str = "- **Time Complexity:** O(?)\n- **Space Complexity:** O(?)";

pub const FOOTER: &str =
    "\n---\n*Solution automatically synced by leetsync 🚀*\n";

/// File extension for a judge language name; unknown names map to themselves.
pub fn language_extension(language: &str) -> String {
    let lower = language.to_lowercase();
    let ext = match lower.as_str() {
        "javascript" => "js",
        "typescript" => "ts",
        "python" | "python3" => "py",
        "java" => "java",
        "cpp" | "c++" => "cpp",
        "csharp" | "c#" => "cs",
        "go" | "golang" => "go",
        "rust" => "rs",
        "kotlin" => "kt",
        "swift" => "swift",
        "ruby" => "rb",
        "php" => "php",
        "scala" => "scala",
        "mysql" | "mssql" | "oraclesql" => "sql",
        _ => return lower,
    };
    ext.to_string()
}

/// `Two Sum!` -> `two-sum`.
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();
    let dashed = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    dashed
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `<slug>_<ext>.md`
pub fn file_name(title: &str, language: &str) -> String {
    format!("{}_{}.md", slugify(title), language_extension(language))
}

/// The folder path is a verbatim prefix, as configured.
pub fn file_path(config: &Configuration, file_name: &str) -> String {
    if config.folder_path.is_empty() {
        file_name.to_string()
    } else {
        format!("{}{}", config.folder_path, file_name)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Problem page for a submission URL: everything before `/submissions`, plus `/`.
pub fn problem_link(url: &str) -> String {
    let base = url.split("/submissions").next().unwrap_or(url);
    format!("{base}/")
}

fn complexity_section(record: &SolutionRecord) -> String {
    let result = record
        .complexity
        .as_ref()
        .map(|c| c.result.trim())
        .filter(|r| !r.is_empty());

    let note = match (result, record.complexity.as_ref().and_then(|c| c.source.as_deref())) {
        (None, _) => String::new(),
        (Some(_), Some("fallback")) => {
            "> ⚠️ _This complexity was estimated locally. Review advised._".to_string()
        }
        (Some(_), Some(source)) => format!(">  _Complexity estimated using AI ({source})._"),
        (Some(_), None) => ">  _Complexity analysis source not available._".to_string(),
    };

    format!(
        "\n## Complexity Analysis\n\n{}\n\n{}\n",
        result.unwrap_or(DEFAULT_COMPLEXITY),
        note
    )
}

pub fn render_markdown(record: &SolutionRecord, config: &Configuration) -> String {
    let ext = language_extension(&record.language);
    let mut doc = format!(
        "# {title}\n\n\
         **Difficulty:** {difficulty}  \n\
         **Language:** {language}  \n\n\
         #### *Problem Link*: [{title}]({link})\n\n\
         ## Performance\n\
         - **Runtime:** {runtime}\n\
         - **Memory:** {memory}\n\n\
         ## Solution\n\
         ```{ext}\n\
         {code}\n\
         ```\n",
        title = record.problem_title,
        difficulty = record.difficulty,
        language = capitalize(&record.language),
        link = problem_link(&record.url),
        runtime = record.runtime,
        memory = record.memory,
        ext = ext,
        code = record.code,
    );

    if config.include_complexity {
        doc.push_str(&complexity_section(record));
    }

    doc.push_str("\n\n");
    doc.push_str(FOOTER);
    doc
}

pub fn commit_message(problem_title: &str, is_update: bool) -> String {
    if is_update {
        format!("📝 Update solution: {problem_title}")
    } else {
        format!("✨ Add solution: {problem_title}")
    }
}

pub const README_COMMIT_MESSAGE: &str = "📝 Initialize repository with README";

pub const REPOSITORY_DESCRIPTION: &str =
    "🚀 My LeetCode solutions automatically synced using leetsync";

/// README written into a freshly created repository.
pub fn initial_readme() -> String {
    "# 🚀 LeetCode Solutions\n\n\
     This repository contains my LeetCode solutions, automatically synced using **leetsync**.\n\n\
     ## 📊 Problem Solving Stats\n\
     - **Total Problems Solved:** Updating automatically...\n\
     - **Easy:** 🟢 \n\
     - **Medium:** 🟡  \n\
     - **Hard:** 🔴 \n\n\
     ## 📁 Repository Structure\n\
     ```\n\
     solutions/\n\
     ├── two-sum_py.md\n\
     ├── add-two-numbers_rs.md\n\
     └── ...\n\
     ```\n\n\
     ## ✨ Features\n\
     Each solution includes:\n\
     - 📝 Clean, readable code\n\
     - 🎯 Problem difficulty and link\n\
     - ⚡ Runtime and memory performance\n\
     - 📊 Complexity analysis section\n\n\
     ---\n\
     *Automatically generated by leetsync*\n"
        .to_string()
}
