// frontend/src/app.rs

use dioxus::prelude::*;

use crate::dashboard::Dashboard;

// --- global css ---
const GLOBAL_CSS: &str = r#"
html, body {
    margin: 0;
    padding: 0;
    width: 100%;
    height: 100%;
    background: #020617;
    color: #e2e8f0;
    font-family: system-ui, sans-serif;
}

:root, html {
    color-scheme: dark;
}

#main {
    width: 100%;
    height: 100%;
    background: #020617;
}

* { box-sizing: border-box; }

#graph {
    width: 100%;
    background: #020617;
    border-radius: 14px;
    border: 1px solid #334155;
    padding: 12px;
}

.controls {
    display: flex;
    gap: 10px;
    margin-top: 14px;
}

.button {
    padding: 8px 18px;
    border-radius: 10px;
    border: 1px solid #334155;
    background: #0f172a;
    color: #e2e8f0;
    font-size: 14px;
    cursor: pointer;
    user-select: none;
}

.button:hover {
    background: #1e293b;
}

.button.disabled {
    opacity: 0.4;
    cursor: default;
}
"#;

#[component]
pub fn App() -> Element {
    rsx! {
        document::Style { "{GLOBAL_CSS}" }
        Dashboard {}
    }
}
