//! HTML Form Rendering

use data_validator::ValidationConfig;
use feature_engine::{CategoricalFamily, PropertyInput};
use inference_engine::InferenceResult;

use crate::format::format_usd;

/// What to show under the form
pub enum Outcome<'a> {
    /// A completed prediction
    Prediction(&'a InferenceResult),
    /// Messages explaining why no prediction was made
    Errors(Vec<String>),
}

/// Form label for a numeric column
fn numeric_label(field: &str) -> &'static str {
    match field {
        "LotFrontage" => "Lot frontage (feet)",
        "LotArea" => "Lot area (sqft)",
        "MasVnrArea" => "Masonry veneer area (sqft)",
        "BsmtFinSF1" => "Finished basement area (sqft)",
        "1stFlrSF" => "First floor area (sqft)",
        "2ndFlrSF" => "Second floor area (sqft)",
        "GarageCars" => "Garage capacity (cars)",
        "GarageArea" => "Garage area (sqft)",
        "WoodDeckSF" => "Wood deck area (sqft)",
        "OpenPorchSF" => "Open porch area (sqft)",
        _ => "Value",
    }
}

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn numeric_inputs(input: &PropertyInput, limits: &ValidationConfig) -> String {
    let mut html = String::new();
    for (field, value) in input.numeric_values() {
        let (min, max) = limits.range_for(field).unwrap_or((0.0, f64::MAX));
        let max_attr = if max < f64::MAX {
            format!(" max=\"{}\"", max)
        } else {
            String::new()
        };
        html.push_str(&format!(
            "<label>{label}<input type=\"number\" name=\"{name}\" value=\"{value}\" min=\"{min}\"{max_attr} step=\"any\" required></label>\n",
            label = numeric_label(field),
            name = escape(field),
            value = value,
            min = min,
            max_attr = max_attr,
        ));
    }
    html
}

fn category_selects(input: &PropertyInput) -> String {
    let mut html = String::new();
    for family in CategoricalFamily::ALL {
        let selected = input.selection(family).to_string();
        html.push_str(&format!(
            "<label>{}<select name=\"{}\">",
            family.label(),
            family.prefix()
        ));
        for option in family.options() {
            let marker = if *option == selected { " selected" } else { "" };
            html.push_str(&format!(
                "<option value=\"{0}\"{1}>{0}</option>",
                escape(option),
                marker
            ));
        }
        html.push_str("</select></label>\n");
    }
    html
}

fn prediction_section(input: &PropertyInput, result: &InferenceResult) -> String {
    let mut html = format!(
        "<section class=\"result\"><p class=\"price\">Predicted house price: <strong>{}</strong></p>\n",
        format_usd(result.prediction.price)
    );

    html.push_str("<details><summary>Input details</summary>\n<h3>Numeric inputs</h3><table>\n");
    for (field, value) in input.numeric_values() {
        html.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>\n",
            escape(field),
            value
        ));
    }
    html.push_str("</table>\n<h3>Categorical inputs</h3><ul>\n");
    for key in input.indicator_keys() {
        html.push_str(&format!("<li>{}</li>\n", escape(&key)));
    }
    html.push_str("</ul></details></section>\n");
    html
}

fn error_section(messages: &[String]) -> String {
    let mut html = String::from("<section class=\"errors\"><p>Could not predict a price:</p><ul>\n");
    for message in messages {
        html.push_str(&format!("<li>{}</li>\n", escape(message)));
    }
    html.push_str("</ul></section>\n");
    html
}

/// Full page: form prefilled with `input`, followed by the outcome if any
pub fn render_page(input: &PropertyInput, limits: &ValidationConfig, outcome: Option<&Outcome<'_>>) -> String {
    let result = match outcome {
        Some(Outcome::Prediction(result)) => prediction_section(input, result),
        Some(Outcome::Errors(messages)) => error_section(messages),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>House Price Prediction</title>
<style>
body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }}
form {{ display: grid; grid-template-columns: 1fr 1fr; gap: 0.75rem 1.5rem; }}
label {{ display: flex; flex-direction: column; font-size: 0.9rem; }}
button {{ grid-column: span 2; padding: 0.6rem; }}
.price {{ font-size: 1.4rem; color: #1b5e20; }}
.errors {{ color: #b71c1c; }}
</style>
</head>
<body>
<h1>House Price Prediction</h1>
<p>Predicts a sale price from property attributes using a pre-trained tree ensemble.</p>
<form method="post" action="/predict">
<h2 style="grid-column: span 2">Property details</h2>
{numeric}<h2 style="grid-column: span 2">Categorical features</h2>
{categorical}<button type="submit">Predict price</button>
</form>
{result}</body>
</html>
"#,
        numeric = numeric_inputs(input, limits),
        categorical = category_selects(input),
        result = result,
    )
}
