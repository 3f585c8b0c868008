//! Two-column research paper rendering and PDF compilation via `latexmk`.

use chrono::{DateTime, Datelike, Local, TimeZone};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tools::command::run_in_dir;
use crate::tools::file::write_file;

/// Document class the rendered paper depends on.
pub const NOBARTICLE_CLS: &str = r"\NeedsTeXFormat{LaTeX2e}
\ProvidesClass{NobArticle}[2023/04/18 Nob Article Class]
\LoadClass[twocolumn]{article}

% Required packages
\RequirePackage{geometry}
\RequirePackage{fancyhdr}
\RequirePackage{titlesec}
\RequirePackage{biblatex}
\RequirePackage{hyperref}

% Page geometry
\geometry{
    paper=a4paper,
    top=2.5cm,
    bottom=2.5cm,
    left=2.5cm,
    right=2.5cm
}

% Header and footer
\pagestyle{fancy}
\fancyhf{}
\renewcommand{\headrulewidth}{0pt}
\newcommand{\runninghead}[1]{\fancyhead[C]{#1}}
\newcommand{\footertext}[1]{\fancyfoot[C]{#1}}
";

const ABSTRACT_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum LatexError {
    #[error("latex io: {0}")]
    Io(#[from] std::io::Error),

    #[error("latexmk failed:\n{0}")]
    Compile(String),

    #[error("latexmk reported success but {0} is missing")]
    MissingPdf(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paper {
    pub title: String,
    pub authors: Vec<String>,
    pub affiliations: Vec<String>,
    pub keywords: Vec<String>,
    /// LaTeX body. Its first 500 characters double as the abstract.
    pub body: String,
}

impl Paper {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            title: "Research Paper".to_string(),
            authors: vec!["Author Name".to_string()],
            affiliations: vec!["Institution Name".to_string()],
            keywords: vec!["Keyword1".to_string(), "Keyword2".to_string()],
            body: body.into(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn authors<I, T>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn affiliations<I, T>(mut self, affiliations: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.affiliations = affiliations.into_iter().map(Into::into).collect();
        self
    }

    pub fn keywords<I, T>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Fill the two-column template. `year` goes into the running footer.
    pub fn render(&self, year: i32) -> String {
        let title = &self.title;
        let authors = self.authors.join(", ");
        let affiliations = self.affiliations.join(r" \\ ");
        let keywords = self.keywords.join(", ");
        let abstract_text: String = self.body.chars().take(ABSTRACT_CHARS).collect();
        let body = &self.body;

        format!(
            r"\documentclass[twocolumn]{{NobArticle}}
\runninghead{{{title}}}
\footertext{{\textit{{Journal X}} ({year})}}

\title{{{title}}}
\author{{{authors}}}
\date{{{affiliations}}}

\renewcommand{{\maketitlehookd}}{{%
\begin{{abstract}}
    \noindent {abstract_text}

    \medskip
    \small{{\textbf{{Index Terms:}} {keywords}.}}
\end{{abstract}}
}}

\begin{{document}}
\small
\maketitle

{body}

\end{{document}}
"
        )
    }

    /// Write `paper.tex` into `dir` and return its path.
    pub fn write(&self, dir: &Path, year: i32) -> Result<PathBuf, LatexError> {
        let path = dir.join("paper.tex");
        write_file(&path, &self.render(year))?;
        tracing::info!(path = %path.display(), "wrote latex source");
        Ok(path)
    }
}

/// Calendar year of `at`, read in `at`'s own time zone.
pub fn year_at<Tz: TimeZone>(at: &DateTime<Tz>) -> i32 {
    at.year()
}

/// Current year in local time, for the running footer.
pub fn current_year() -> i32 {
    year_at(&Local::now())
}

/// Write `NobArticle.cls` into `dir`.
pub fn write_document_class(dir: &Path) -> Result<PathBuf, LatexError> {
    let path = dir.join("NobArticle.cls");
    write_file(&path, NOBARTICLE_CLS)?;
    Ok(path)
}

/// Compile `tex` (a file name inside `dir`) to PDF.
///
/// Auxiliary files are cleaned with `latexmk -c` whether or not the build
/// succeeds.
pub fn compile(dir: &Path, tex: &str) -> Result<PathBuf, LatexError> {
    let result = build(dir, tex);

    match run_in_dir(dir, "latexmk", &["-c", tex]) {
        Ok(out) if !out.success => {
            tracing::warn!(diagnostics = %out.diagnostics(), "latexmk cleanup failed")
        }
        Err(e) => tracing::warn!(error = %e, "latexmk cleanup failed"),
        Ok(_) => {}
    }

    result
}

fn build(dir: &Path, tex: &str) -> Result<PathBuf, LatexError> {
    let out = run_in_dir(dir, "latexmk", &["-pdf", "-interaction=nonstopmode", tex])?;
    if !out.success {
        return Err(LatexError::Compile(out.diagnostics()));
    }

    let pdf = dir.join(Path::new(tex).with_extension("pdf"));
    if !pdf.exists() {
        return Err(LatexError::MissingPdf(pdf));
    }
    tracing::info!(pdf = %pdf.display(), "compiled pdf");
    Ok(pdf)
}

/// Class file, source and PDF in one go.
pub fn generate_pdf(dir: &Path, paper: &Paper, year: i32) -> Result<PathBuf, LatexError> {
    write_document_class(dir)?;
    let tex = paper.write(dir, year)?;
    let name = tex
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("paper.tex")
        .to_string();
    compile(dir, &name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("solution-loop-latex-{tag}-{}", std::process::id()))
    }

    #[test]
    fn year_follows_calendar_at_new_year() {
        use chrono::{FixedOffset, Utc};

        let last_second = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(year_at(&last_second), 2023);
        assert_eq!(year_at(&midnight), 2024);

        // 00:30 in UTC+1 is still 2023 in UTC
        let east = FixedOffset::east_opt(3600).unwrap();
        let local = east.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap();
        assert_eq!(year_at(&local), 2024);
        assert_eq!(year_at(&local.with_timezone(&Utc)), 2023);
    }

    #[test]
    fn current_year_matches_clock() {
        let utc_year = chrono::Utc::now().year();
        assert!((current_year() - utc_year).abs() <= 1);
    }

    #[test]
    fn defaults() {
        let paper = Paper::new("body");
        assert_eq!(paper.title, "Research Paper");
        assert_eq!(paper.authors, ["Author Name"]);
        assert_eq!(paper.affiliations, ["Institution Name"]);
        assert_eq!(paper.keywords, ["Keyword1", "Keyword2"]);
    }

    #[test]
    fn render_fills_template() {
        let tex = Paper::new(r"\section{Intro} Hello.")
            .title("Battery Life")
            .authors(["Ada", "Grace"])
            .affiliations(["Uni A", "Lab B"])
            .keywords(["power", "sensors"])
            .render(1999);

        assert!(tex.starts_with(r"\documentclass[twocolumn]{NobArticle}"));
        assert!(tex.contains(r"\runninghead{Battery Life}"));
        assert!(tex.contains(r"\footertext{\textit{Journal X} (1999)}"));
        assert!(tex.contains(r"\author{Ada, Grace}"));
        assert!(tex.contains(r"\date{Uni A \\ Lab B}"));
        assert!(tex.contains(r"\textbf{Index Terms:} power, sensors.}"));
        assert!(tex.contains(r"\noindent \section{Intro} Hello."));
        assert!(tex.trim_end().ends_with(r"\end{document}"));
    }

    #[test]
    fn abstract_is_first_500_chars() {
        let body = "é".repeat(600);
        let tex = Paper::new(body.clone()).render(2000);
        let abstract_line = format!(r"\noindent {}", "é".repeat(500));
        assert!(tex.contains(&format!("{abstract_line}\n")));
        assert!(tex.contains(&body));
    }

    #[test]
    fn writes_class_and_source() {
        let dir = scratch("write");
        let cls = write_document_class(&dir).unwrap();
        let tex = Paper::new("x").write(&dir, 2001).unwrap();

        assert!(std::fs::read_to_string(cls).unwrap().contains(r"\ProvidesClass{NobArticle}"));
        assert!(std::fs::read_to_string(&tex).unwrap().contains("(2001)"));
        assert_eq!(tex.file_name().unwrap(), "paper.tex");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn compile_of_missing_source_fails() {
        // Either latexmk is absent (io) or it rejects the missing file.
        let dir = scratch("missing");
        std::fs::create_dir_all(&dir).unwrap();

        assert!(compile(&dir, "does_not_exist.tex").is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
