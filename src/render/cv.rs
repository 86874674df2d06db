use std::fmt::Write;

use super::escape_latex as tex;
use crate::model::{NewsCategory, NewsDocument, PersonalProfile, PublicationStatus, PublicationsDocument};

const PREAMBLE: &str = r"\documentclass[11pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage[margin=2cm]{geometry}
\usepackage{enumitem}
\usepackage[hidelinks]{hyperref}
\setlength{\parindent}{0pt}
\pagestyle{empty}
";

/// A one-file LaTeX CV built from the profile, publications and award news.
pub fn render_cv(
    profile: &PersonalProfile,
    publications: &PublicationsDocument,
    news: &NewsDocument,
    include_unreviewed: bool,
) -> String {
    let mut out = String::from(PREAMBLE);
    out.push_str("\\begin{document}\n\n");

    let _ = writeln!(out, "{{\\LARGE\\bfseries {}}}\\\\[4pt]", tex(&profile.name));
    if !profile.title.is_empty() {
        let _ = writeln!(out, "{}\\\\", tex(&profile.title));
    }
    let inst = &profile.institution;
    if !inst.department.is_empty() || !inst.name.is_empty() {
        let parts: Vec<String> = [&inst.department, &inst.name]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| tex(s))
            .collect();
        let _ = writeln!(out, "{}\\\\", parts.join(", "));
    }
    for (platform, url) in &profile.social {
        let _ = writeln!(out, "\\href{{{}}}{{{}}}\\quad", tex(url), tex(platform));
    }
    out.push('\n');

    if !profile.research.focus.is_empty() || !profile.research.description.is_empty() {
        out.push_str("\\section*{Research}\n");
        if !profile.research.focus.is_empty() {
            let _ = writeln!(out, "\\textbf{{{}}}\\\\", tex(&profile.research.focus));
        }
        if !profile.research.description.is_empty() {
            let _ = writeln!(out, "{}", tex(&profile.research.description));
        }
        out.push('\n');
    }

    if !profile.background.education.is_empty() {
        out.push_str("\\section*{Education}\n\\begin{itemize}[leftmargin=*]\n");
        for e in &profile.background.education {
            let _ = write!(out, "  \\item \\textbf{{{}}}, {}", tex(&e.degree), tex(&e.institution));
            if let Some(country) = e.country.as_deref().filter(|c| !c.is_empty()) {
                let _ = write!(out, " ({})", tex(country));
            }
            out.push('\n');
        }
        out.push_str("\\end{itemize}\n\n");
    }

    let visible: Vec<_> = publications
        .publications
        .iter()
        .filter(|p| include_unreviewed || !p.needs_review)
        .collect();
    for status in PublicationStatus::ALL {
        let group: Vec<_> = visible.iter().filter(|p| p.status == status).collect();
        if group.is_empty() {
            continue;
        }
        let heading = match status {
            PublicationStatus::Published => "Publications",
            PublicationStatus::Submitted => "Submitted",
            PublicationStatus::InPreparation => "In Preparation",
        };
        let _ = writeln!(out, "\\section*{{{}}}\n\\begin{{enumerate}}[leftmargin=*]", heading);
        for p in group {
            let authors: Vec<String> = p.authors.iter().map(|a| tex(a)).collect();
            let _ = write!(
                out,
                "  \\item {}. \\textit{{{}}}. {}, {}.",
                authors.join(", "),
                tex(&p.title),
                tex(&p.journal),
                p.year
            );
            if let Some(doi) = &p.doi {
                let _ = write!(out, " \\href{{https://doi.org/{0}}}{{doi:{0}}}", tex(doi));
            }
            out.push('\n');
        }
        out.push_str("\\end{enumerate}\n\n");
    }

    let awards: Vec<_> = news
        .news
        .iter()
        .filter(|n| n.category == NewsCategory::Awards)
        .filter(|n| include_unreviewed || !n.needs_review)
        .collect();
    if !awards.is_empty() {
        out.push_str("\\section*{Awards}\n\\begin{itemize}[leftmargin=*]\n");
        for n in awards {
            let year = n.date.get(..4).unwrap_or(&n.date);
            let _ = writeln!(out, "  \\item {} \\hfill {}", tex(&n.title), tex(year));
        }
        out.push_str("\\end{itemize}\n\n");
    }

    if !profile.interests.is_empty() {
        let interests: Vec<String> = profile.interests.iter().map(|i| tex(i)).collect();
        let _ = writeln!(out, "\\section*{{Interests}}\n{}\n", interests.join(", "));
    }

    out.push_str("\\end{document}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewsItem, Publication};

    #[test]
    fn cv_groups_by_status_and_escapes() {
        let profile = PersonalProfile {
            name: "Ada Korol".into(),
            title: "Professor".into(),
            interests: vec!["R&D".into()],
            ..PersonalProfile::default()
        };
        let pubs = PublicationsDocument {
            publications: vec![
                Publication {
                    id: "a".into(),
                    title: "100% spin".into(),
                    authors: vec!["Ada Korol".into()],
                    journal: "PRB".into(),
                    year: 2024,
                    ..Publication::default()
                },
                Publication {
                    id: "b".into(),
                    title: "Draft".into(),
                    year: 2025,
                    status: PublicationStatus::Submitted,
                    ..Publication::default()
                },
                Publication {
                    id: "c".into(),
                    title: "Placeholder".into(),
                    year: 2025,
                    needs_review: true,
                    ..Publication::default()
                },
            ],
            ..PublicationsDocument::default()
        };
        let news = NewsDocument {
            news: vec![NewsItem {
                id: "n".into(),
                title: "Best paper".into(),
                date: "2023-05-01".into(),
                category: NewsCategory::Awards,
                ..NewsItem::default()
            }],
            ..NewsDocument::default()
        };

        let tex = render_cv(&profile, &pubs, &news, false);
        assert_eq!(tex, render_cv(&profile, &pubs, &news, false));
        assert!(tex.starts_with("\\documentclass"));
        assert!(tex.ends_with("\\end{document}\n"));
        assert!(tex.contains("\\textit{100\\% spin}"));
        assert!(tex.contains("\\section*{Submitted}"));
        assert!(!tex.contains("Placeholder"));
        assert!(tex.contains("\\item Best paper \\hfill 2023"));
        assert!(tex.contains("R\\&D"));
        assert!(tex.find("Publications").unwrap() < tex.find("Submitted").unwrap());
    }
}
