//! Test fixtures - reusable content constants for tests.

/// A descriptor with no dependencies and one resource root
pub const DESCRIPTOR: &str = r#"{
    "name": "energy-forms",
    "version": "1.2.0",
    "license": "MIT",
    "titleStringKey": "energy-forms.title",
    "main": "build/energy-forms.min.js",
    "template": "templates/sim.html",
    "strings": "strings.json",
    "preload": ["lib/vendor.js"],
    "resourceRoots": ["images"]
}"#;

/// Template exercising every placeholder the pipeline substitutes
pub const SIM_TEMPLATE: &str = r#"<!DOCTYPE html>
<!--
{{LEGAL_HEADER}}
-->
<html lang="{{LOCALE}}">
<head><title>{{TITLE}}</title></head>
<body>
{{PRELOAD_SCRIPTS}}
<script>
window.sim = { project: "{{PROJECT}}", version: "{{VERSION}}", built: "{{BUILD_TIMESTAMP}}" };
window.sim.strings = {{STRINGS}};
window.sim.mipmaps = {{MIPMAPS}};
</script>
{{MAIN_SCRIPT}}
<!-- dependencies:
{{DEPENDENCIES}}
-->
<!-- third-party licenses:
{{LICENSE_REPORT}}
-->
</body>
</html>
"#;

/// English and Spanish strings; Spanish leaves "play" untranslated
pub const STRINGS: &str = r#"{
    "en": {
        "energy-forms.title": "Energy Forms",
        "energy-forms.play": "Play"
    },
    "es": {
        "energy-forms.title": "Formas de Energía",
        "energy-forms.play": ""
    }
}"#;

/// Harness page for testing the artifact inside an iframe
pub const IFRAME_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>{{TITLE}}</title></head>
<body><iframe src="{{SIM_URL}}" width="768" height="504"></iframe></body>
</html>
"#;

pub const MAIN_JS: &str = "console.log('simulation main bundle');";

pub const PRELOAD_JS: &str = "window.vendor = {};";

/// Config pointing the canonical site at the test organization
pub const CONFIG: &str = r#"
[build]
locales = ["en", "es"]

[license]
canonical_site = "https://sims.example.org"
"#;

/// A license manifest whose single entry passes the allow-list rule
pub fn compatible_manifest(filename: &str) -> String {
    format!(
        r#"{{
            "{filename}": {{
                "text": "Historic photograph",
                "projectURL": "https://archive.example.com/photos",
                "license": "Public Domain",
                "notes": ""
            }}
        }}"#
    )
}

/// A license manifest whose single entry matches no compatible rule
pub fn problematic_manifest(filename: &str) -> String {
    format!(
        r#"{{
            "{filename}": {{
                "text": "Stock image",
                "projectURL": "https://stock.example.com",
                "license": "All Rights Reserved",
                "notes": ""
            }}
        }}"#
    )
}
