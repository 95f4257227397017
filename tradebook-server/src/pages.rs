//! HTML pages and the site stylesheet.

use std::fmt::Write as _;

use tradebook_sheets::Units;

pub const STATIC_ROOT: &str = "/static";

/// Class for tables that need padding between columns.
pub const SPACED_TABLE: &str = "SPACED_TABLE";

pub const CSS: &str = "\
html, body, table {
  font-size: 24px;
  font-family: verdana, arial, helvetica, sans-serif;
}
ul {
  padding-left: 0px;
  list-style-type: none;
}
li {
  padding-bottom: 15px;
}
.SPACED_TABLE td {
  padding-right: 15px;
}
a:hover {
  color: red;
}
";

/// Escape text for use in element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<link rel=\"stylesheet\" href=\"/css\">\n</head>\n\
         <body>\n{body}</body>\n</html>\n",
        title = escape(title),
    )
}

fn root_choices(message: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(message) = message {
        let _ = writeln!(body, "<h2>{}</h2>", escape(message));
    }
    body.push_str(
        "<ul>\n\
         <li><a href=\"/trade\">Trade</a></li>\n\
         <li><a href=\"/units\">Balances</a></li>\n\
         <li><a href=\"/admin\">Admin</a></li>\n\
         </ul>\n",
    );
    body
}

pub fn root_page() -> String {
    page("Trading", &format!("<h1>Trading</h1>\n{}", root_choices(None)))
}

pub fn invalid_url_page() -> String {
    page("Invalid URL", &root_choices(Some("Invalid URL")))
}

pub fn error_page(message: &str) -> String {
    page(
        "Error",
        &format!(
            "<h2>{}</h2>\n<p><a href=\"/\">Home</a></p>\n",
            escape(message)
        ),
    )
}

pub fn trade_page(username: &str, balance: Option<i64>) -> String {
    let balance = balance.map_or_else(|| "no balance yet".to_string(), |b| b.to_string());
    let body = format!(
        "<h1>Trading as {user}</h1>\n\
         <p>Current units: {balance}</p>\n\
         <form method=\"post\" action=\"/trade\">\n\
         <label>Units <input type=\"text\" name=\"units\"></label>\n\
         <input type=\"submit\" value=\"Trade\">\n\
         </form>\n\
         <p><a href=\"/units\">All balances</a> | <a href=\"/\">Home</a></p>\n",
        user = escape(username),
    );
    page("Trade", &body)
}

pub fn units_page(units: &[Units]) -> String {
    let mut body = format!("<h1>Balances</h1>\n<table class=\"{SPACED_TABLE}\">\n");
    body.push_str("<tr><th>Trader</th><th>Units</th></tr>\n");
    for row in units {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(&row.username),
            row.units
        );
    }
    body.push_str("</table>\n<p><a href=\"/\">Home</a></p>\n");
    page("Balances", &body)
}

pub fn admin_page(users_cached: bool, units_cached: bool) -> String {
    let status = |cached: bool| if cached { "cached" } else { "not loaded" };
    let body = format!(
        "<h1>Admin</h1>\n<table class=\"{SPACED_TABLE}\">\n\
         <tr><td>Users</td><td>{users}</td><td>{refresh_users}</td></tr>\n\
         <tr><td>Units</td><td>{units}</td><td>{refresh_units}</td></tr>\n\
         </table>\n{clear}<p><a href=\"/\">Home</a></p>\n",
        users = status(users_cached),
        units = status(units_cached),
        refresh_users = post_button("/admin/refresh/users", "Refresh"),
        refresh_units = post_button("/admin/refresh/units", "Refresh"),
        clear = post_button("/admin/trades/clear", "Clear trades"),
    );
    page("Admin", &body)
}

fn post_button(action: &str, label: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\"><input type=\"submit\" value=\"{label}\"></form>\n"
    )
}
