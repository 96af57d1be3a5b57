// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The upload page.

use convertdmc_core::Operation;
use convertdmc_core::human_errors::HumanError;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS: &str = "\
body { font-family: Arial, sans-serif; text-align: center; margin: 50px; }
h1 { color: #0072ff; }
button { padding: 10px 20px; font-size: 16px; margin-top: 10px; }
.error { display: inline-block; text-align: left; border: 1px solid #d33; \
background: #fdecec; padding: 10px 20px; margin-bottom: 20px; }
.error small { color: #666; }
.counter { color: #555; margin-top: 30px; }";

/// What the page shows besides the form.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    /// Successful conversions in this session.
    pub conversions: u64,
    /// Option to preselect, e.g. after a failed attempt.
    pub selected: Option<Operation>,
    pub error: Option<&'a HumanError>,
}

pub fn render(view: &PageView<'_>) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "ConvertDMC" }
                style { (PreEscaped(CSS)) }
            }
            body {
                h1 { "ConvertDMC" }
                @if let Some(error) = view.error {
                    div.error role="alert" {
                        strong { (error.message) }
                        p { (error.suggestion) }
                        small { (error.detail) }
                    }
                }
                p { "Upload your file and choose the operation:" }
                form action="/convert" method="post" enctype="multipart/form-data" {
                    select name="option" {
                        @for operation in Operation::ALL {
                            option value=(operation.as_str()) selected[view.selected == Some(operation)] {
                                (operation.label())
                            }
                        }
                    }
                    br; br;
                    input type="file" name="file" required;
                    br; br;
                    button type="submit" { "Convert" }
                }
                p.counter { "Successful conversions this session: " (view.conversions) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_operation() {
        let page = render(&PageView::default()).into_string();
        for operation in Operation::ALL {
            assert!(page.contains(&format!("value=\"{}\"", operation.as_str())));
            assert!(page.contains(operation.label()));
        }
        assert!(page.contains("Successful conversions this session: 0"));
        assert!(!page.contains("role=\"alert\""));
    }

    #[test]
    fn shows_error_and_keeps_selection() {
        let error = HumanError {
            message: "The file could not be read.".into(),
            suggestion: "Try again.".into(),
            detail: "could not decode <PDF> document".into(),
        };
        let page = render(&PageView {
            conversions: 3,
            selected: Some(Operation::SplitPdf),
            error: Some(&error),
        })
        .into_string();

        assert!(page.contains("The file could not be read."));
        assert!(page.contains("could not decode &lt;PDF&gt; document"));
        assert!(page.contains("value=\"SplitPdf\" selected"));
        assert!(page.contains("Successful conversions this session: 3"));
    }
}
