//! Server-rendered HTML. Every user-supplied string goes through [`escape`].

use std::fmt::Write;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{
    auth::repo_types::User,
    cookies,
    flash::{Flash, FLASH_COOKIE},
    predictions::{
        dto::{PredictForm, PredictionOutcome},
        repo_types::Prediction,
        services::DashboardSummary,
    },
};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// A full page inside the shared layout.
pub struct Page {
    status: StatusCode,
    title: &'static str,
    body: String,
    user_name: Option<String>,
    flash: Option<Flash>,
}

impl Page {
    pub fn new(title: &'static str, body: String) -> Self {
        Self {
            status: StatusCode::OK,
            title,
            body,
            user_name: None,
            flash: None,
        }
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = format!(
            "<h1>Error</h1><p>{}</p><p><a href=\"/\">Back to home</a></p>",
            escape(message)
        );
        Self {
            status,
            ..Self::new("Error", body)
        }
    }

    pub fn user(mut self, name: Option<&str>) -> Self {
        self.user_name = name.map(str::to_string);
        self
    }

    pub fn flash(mut self, flash: Option<Flash>) -> Self {
        if flash.is_some() {
            self.flash = flash;
        }
        self
    }

    fn render(&self) -> String {
        let nav = match &self.user_name {
            Some(name) => format!(
                "<span>Hi, {}</span> <a href=\"/dashboard\">Dashboard</a> \
                 <a href=\"/predict\">Predict</a> <a href=\"/profile\">Profile</a> \
                 <a href=\"/logout\">Logout</a>",
                escape(name)
            ),
            None => "<a href=\"/auth\">Login / Register</a>".to_string(),
        };
        let flash = self
            .flash
            .as_ref()
            .map(|f| {
                format!(
                    "<div class=\"flash flash-{}\">{}</div>",
                    f.level.as_str(),
                    escape(&f.message)
                )
            })
            .unwrap_or_default();
        format!(
            "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
             <title>{title} | HemoSense</title></head><body>\
             <header><a href=\"/\"><strong>HemoSense</strong></a> <nav>{nav}</nav></header>\
             <main>{flash}{body}</main></body></html>",
            title = self.title,
            nav = nav,
            flash = flash,
            body = self.body,
        )
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let html = self.render();
        let res = (self.status, Html(html)).into_response();
        if self.flash.is_some() {
            cookies::with_cookies(res, [cookies::clear(FLASH_COOKIE)])
        } else {
            res
        }
    }
}

pub fn index_body(logged_in: bool) -> String {
    let cta = if logged_in {
        "<a href=\"/predict\">Check a new blood test</a>"
    } else {
        "<a href=\"/auth\">Create an account or log in to get started</a>"
    };
    format!(
        "<h1>Anemia screening from your blood test</h1>\
         <p>Enter your hemoglobin and red blood cell indices to get a quick \
         Normal / Anemia screening result, tips, and a history of past checks.</p>\
         <p>{}</p>",
        cta
    )
}

pub fn auth_body() -> String {
    "<section><h2>Login</h2>\
     <form method=\"post\" action=\"/login\">\
     <label>Email <input type=\"email\" name=\"email\" required></label>\
     <label>Password <input type=\"password\" name=\"password\" required></label>\
     <button type=\"submit\">Login</button></form></section>\
     <section><h2>Register</h2>\
     <form method=\"post\" action=\"/register\">\
     <label>Name <input type=\"text\" name=\"name\" required></label>\
     <label>Email <input type=\"email\" name=\"email\" required></label>\
     <label>Password <input type=\"password\" name=\"password\" required></label>\
     <button type=\"submit\">Register</button></form></section>"
        .to_string()
}

pub fn profile_body(user: &User) -> String {
    format!(
        "<h1>Profile</h1><dl><dt>Name</dt><dd>{}</dd><dt>Email</dt><dd>{}</dd>\
         <dt>Member since</dt><dd>{}</dd></dl>\
         <p><a href=\"/change_password\">Change password</a></p>",
        escape(&user.name),
        escape(&user.email),
        user.created_at.date()
    )
}

pub fn change_password_body() -> String {
    "<h1>Change password</h1>\
     <form method=\"post\" action=\"/change_password\">\
     <label>Current password <input type=\"password\" name=\"old_password\" required></label>\
     <label>New password <input type=\"password\" name=\"new_password\" required></label>\
     <label>Confirm new password <input type=\"password\" name=\"confirm_new\" required></label>\
     <button type=\"submit\">Update</button></form>"
        .to_string()
}

fn confidence_text(confidence: Option<f64>) -> String {
    confidence
        .map(|c| format!("{:.2}%", c))
        .unwrap_or_else(|| "n/a".to_string())
}

fn prediction_row(p: &Prediction) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        p.created_at.date(),
        p.age,
        escape(&p.gender),
        p.hb,
        escape(&p.category),
        confidence_text(p.confidence)
    )
}

pub fn dashboard_body(name: &str, summary: &DashboardSummary) -> String {
    let mut out = format!(
        "<h1>Welcome, {}</h1><p>Total predictions: <strong>{}</strong></p>",
        escape(name),
        summary.total
    );

    out.push_str("<h2>By category</h2><ul>");
    for (category, count) in &summary.category_counts {
        let _ = write!(out, "<li>{}: {}</li>", escape(category), count);
    }
    out.push_str("</ul><h2>Hemoglobin ranges (g/dL)</h2><ul>");
    for (band, count) in summary.hb_ranges.entries() {
        let _ = write!(out, "<li>{}: {}</li>", escape(band), count);
    }
    out.push_str("</ul><h2>Recent predictions</h2>");

    if summary.recent.is_empty() {
        out.push_str("<p>No predictions yet. <a href=\"/predict\">Make your first one</a>.</p>");
    } else {
        out.push_str(
            "<table><thead><tr><th>Date</th><th>Age</th><th>Gender</th><th>Hb</th>\
             <th>Result</th><th>Confidence</th></tr></thead><tbody>",
        );
        for p in &summary.recent {
            out.push_str(&prediction_row(p));
        }
        out.push_str("</tbody></table>");
    }
    out
}

fn input(label: &str, name: &str, value: &str) -> String {
    format!(
        "<label>{} <input type=\"text\" name=\"{}\" value=\"{}\"></label>",
        label,
        name,
        escape(value)
    )
}

pub fn predict_body(form: &PredictForm, outcome: Option<&PredictionOutcome>) -> String {
    let mut out = String::from("<h1>New prediction</h1><form method=\"post\" action=\"/predict\">");
    out.push_str(&input("Age", "age", &form.age));
    out.push_str(&input("Gender (female / male / other)", "gender", &form.gender));
    out.push_str(&input("Hemoglobin (g/dL)", "hb", &form.hb));
    out.push_str(&input("MCH (pg, optional)", "mch", &form.mch));
    out.push_str(&input("MCHC (g/dL, optional)", "mchc", &form.mchc));
    out.push_str(&input("MCV (fL, optional)", "mcv", &form.mcv));
    out.push_str("<button type=\"submit\">Predict</button></form>");

    if let Some(outcome) = outcome {
        let _ = write!(
            out,
            "<section class=\"result\"><h2>Result: {}</h2><p>Confidence: {}</p><h3>Tips</h3><ul>",
            escape(&outcome.category),
            confidence_text(outcome.confidence)
        );
        for tip in outcome.tips {
            let _ = write!(out, "<li>{}</li>", escape(tip));
        }
        out.push_str("</ul></section>");
    }
    out
}
