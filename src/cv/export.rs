//! Print-ready HTML rendering of a [`CvSnapshot`].

use super::snapshot::CvSnapshot;
use super::theme::ThemePalette;
use crate::core::Language;
use std::fmt::Write;

struct SectionTitles {
    profile: &'static str,
    experience: &'static str,
    education: &'static str,
    skills: &'static str,
    projects: &'static str,
}

fn titles(lang: Language) -> SectionTitles {
    match lang {
        Language::Fr => SectionTitles {
            profile: "Profil",
            experience: "Expérience Professionnelle",
            education: "Formation",
            skills: "Compétences",
            projects: "Projets",
        },
        Language::En => SectionTitles {
            profile: "Profile",
            experience: "Work Experience",
            education: "Education",
            skills: "Skills",
            projects: "Projects",
        },
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn joined(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| escape_html(p))
        .collect::<Vec<_>>()
        .join(" &bull; ")
}

fn stylesheet(palette: &ThemePalette) -> String {
    format!(
        r#"@page {{ size: A4; margin: 18mm; }}
body {{ font-family: Helvetica, Arial, sans-serif; color: #2d3748; font-size: 10.5pt; line-height: 1.45; margin: 0; }}
header {{ text-align: center; margin-bottom: 18px; }}
h1 {{ color: hsl({primary}); font-size: 26pt; margin: 0; }}
.title {{ font-size: 13pt; margin: 4px 0; }}
.meta {{ color: #718096; font-size: 9pt; }}
h2 {{ color: hsl({primary}); text-transform: uppercase; font-size: 13pt; border-bottom: 1px solid hsl({primary}); padding-bottom: 2px; margin: 18px 0 8px; }}
.entry {{ margin-bottom: 10px; page-break-inside: avoid; }}
.entry-head {{ display: flex; justify-content: space-between; font-weight: bold; }}
.entry-sub {{ color: #718096; font-style: italic; }}
.tags {{ color: #718096; font-size: 9pt; }}
@media print {{ a {{ color: inherit; text-decoration: none; }} }}
"#,
        primary = palette.light.primary
    )
}

/// Renders a standalone HTML document meant to be printed to PDF by the browser.
/// Sections with no entries are left out.
pub fn render_print_html(cv: &CvSnapshot, palette: &ThemePalette) -> String {
    let t = titles(cv.lang);
    let p = &cv.personal_info;
    let mut html = String::with_capacity(8 * 1024);

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{name} - CV</title>\n<style>\n{css}</style>\n</head>\n<body>\n",
        lang = cv.lang,
        name = escape_html(&p.name),
        css = stylesheet(palette),
    );

    let _ = write!(
        html,
        "<header>\n<h1>{}</h1>\n<div class=\"title\">{}</div>\n<div class=\"meta\">{}</div>\n",
        escape_html(&p.name),
        escape_html(&p.title),
        joined(&[&p.email, &p.phone, &p.location]),
    );
    let socials = joined(&[&p.socials.linkedin, &p.socials.github, &p.socials.website]);
    if !socials.is_empty() {
        let _ = writeln!(html, "<div class=\"meta\">{socials}</div>");
    }
    html.push_str("</header>\n");

    if !p.summary.trim().is_empty() {
        let _ = write!(
            html,
            "<section>\n<h2>{}</h2>\n<p>{}</p>\n</section>\n",
            t.profile,
            escape_html(&p.summary)
        );
    }

    if !cv.experiences.is_empty() {
        let _ = writeln!(html, "<section>\n<h2>{}</h2>", t.experience);
        for e in &cv.experiences {
            let _ = write!(
                html,
                "<div class=\"entry\">\n<div class=\"entry-head\"><span>{}</span><span>{}</span></div>\n\
                 <div class=\"entry-sub\">{}</div>\n<p>{}</p>\n",
                escape_html(&e.position),
                escape_html(&e.duration),
                escape_html(&e.company),
                escape_html(&e.description),
            );
            if !e.technologies.is_empty() {
                let tags: Vec<&str> = e.technologies.iter().map(String::as_str).collect();
                let _ = writeln!(html, "<div class=\"tags\">{}</div>", joined(&tags));
            }
            html.push_str("</div>\n");
        }
        html.push_str("</section>\n");
    }

    if !cv.education.is_empty() {
        let _ = writeln!(html, "<section>\n<h2>{}</h2>", t.education);
        for e in &cv.education {
            let _ = write!(
                html,
                "<div class=\"entry\">\n<div class=\"entry-head\"><span>{}</span><span>{}</span></div>\n\
                 <div class=\"entry-sub\">{}</div>\n<p>{}</p>\n</div>\n",
                escape_html(&e.degree),
                escape_html(&e.duration),
                escape_html(&e.institution),
                escape_html(&e.description),
            );
        }
        html.push_str("</section>\n");
    }

    if !cv.skills.is_empty() {
        let _ = writeln!(html, "<section>\n<h2>{}</h2>", t.skills);
        for category in &cv.skills {
            let techs: Vec<String> = category
                .technologies
                .iter()
                .map(|s| format!("{} ({}%)", escape_html(&s.name), s.level))
                .collect();
            let _ = writeln!(
                html,
                "<div class=\"entry\"><strong>{}:</strong> {}</div>",
                escape_html(&category.category),
                techs.join(", ")
            );
        }
        html.push_str("</section>\n");
    }

    if !cv.projects.is_empty() {
        let _ = writeln!(html, "<section>\n<h2>{}</h2>", t.projects);
        for project in &cv.projects {
            let _ = write!(
                html,
                "<div class=\"entry\">\n<div class=\"entry-head\"><span>{}</span></div>\n<p>{}</p>\n",
                escape_html(&project.title),
                escape_html(&project.description),
            );
            if !project.technologies.is_empty() {
                let tags: Vec<&str> = project.technologies.iter().map(String::as_str).collect();
                let _ = writeln!(html, "<div class=\"tags\">{}</div>", joined(&tags));
            }
            let links = joined(&[&project.demo_link, &project.github_link]);
            if !links.is_empty() {
                let _ = writeln!(html, "<div class=\"meta\">{links}</div>");
            }
            html.push_str("</div>\n");
        }
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
