//! Insertion-ordered HTML attribute builder.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::html::printer::Printer;
use crate::links::Attribute;

/// Query strings keep the characters URL form encoding keeps.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// An ordered attribute map. Insertion order is preserved on print so the
/// output is stable; repeated `add`s extend a space-delimited value, which
/// is what `class` needs.
#[derive(Debug, Default, Clone)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Attributes::default()
    }

    pub fn with(name: &str, value: &str) -> Self {
        let mut attributes = Attributes::new();
        attributes.add(name, value);
        attributes
    }

    pub fn from_list(list: &[Attribute]) -> Self {
        let mut attributes = Attributes::new();
        for attribute in list {
            attributes.add(&attribute.name, &attribute.value);
        }
        attributes
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    /// Append to the attribute, space-delimited when it already exists.
    pub fn add(&mut self, name: &str, value: &str) -> &mut Self {
        match self.position(name) {
            Some(i) => {
                self.entries[i].1.push(' ');
                self.entries[i].1.push_str(value);
            }
            None => self.entries.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn replace(&mut self, name: &str, value: &str) -> &mut Self {
        match self.position(name) {
            Some(i) => self.entries[i].1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.entries.retain(|(n, _)| n != name);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get<'v>(&'v self, name: &str, value_if_missing: &'v str) -> &'v str {
        match self.position(name) {
            Some(i) => &self.entries[i].1,
            None => value_if_missing,
        }
    }

    pub fn add_class(&mut self, value: &str) -> &mut Self {
        self.add("class", value)
    }

    pub fn replace_class(&mut self, value: &str) -> &mut Self {
        self.replace("class", value)
    }

    pub fn remove_class(&mut self, value: &str) -> &mut Self {
        if let Some(i) = self.position("class") {
            let kept: Vec<&str> = self.entries[i]
                .1
                .split(' ')
                .filter(|c| !c.is_empty() && *c != value)
                .collect();
            self.entries[i].1 = kept.join(" ");
        }
        self
    }

    pub fn has_class(&self, value: &str) -> bool {
        self.get("class", "")
            .split(' ')
            .any(|c| c == value)
    }

    /// Print in insertion order. `class` is trimmed and skipped when empty;
    /// `src`/`href` values with a query get the query percent-encoded;
    /// everything else escapes backslashes and quotes.
    pub(crate) fn print(&self, printer: &mut Printer) {
        for (name, raw_value) in &self.entries {
            let value = raw_value.trim();
            if name == "class" {
                if value.is_empty() {
                    continue;
                }
                print_attribute(printer, name, &escape_value(raw_value));
            } else if (name == "src" || name == "href") && value.contains('?') {
                print_attribute(printer, name, &encode_query(value));
            } else {
                print_attribute(printer, name, &escape_value(value));
            }
        }
    }
}

fn print_attribute(printer: &mut Printer, name: &str, value: &str) {
    printer
        .print_char(' ')
        .print(name)
        .print("=\"")
        .print(value)
        .print_char('"');
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Percent-encode the query portion of a URL, keeping `=` and `&` usable
/// (`&` prints as an entity) and mapping spaces to `%20`.
fn encode_query(value: &str) -> String {
    match value.split_once('?') {
        Some((path, query)) => {
            let encoded = utf8_percent_encode(query, QUERY_ENCODE)
                .to_string()
                .replace("%3D", "=")
                .replace("%26", "&amp;");
            format!("{path}?{encoded}")
        }
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print_to_string(attributes: &Attributes) -> String {
        let mut printer = Printer::new();
        attributes.print(&mut printer);
        printer.take()
    }

    #[test]
    fn preserves_insertion_order() {
        let mut attributes = Attributes::new();
        attributes.add("href", "#x").add("rel", "nofollow").add("title", "t");
        assert_eq!(
            print_to_string(&attributes),
            " href=\"#x\" rel=\"nofollow\" title=\"t\""
        );
    }

    #[test]
    fn add_appends_space_delimited() {
        let mut attributes = Attributes::new();
        attributes.add_class("a").add_class("b");
        assert_eq!(print_to_string(&attributes), " class=\"a b\"");
        assert!(attributes.has_class("a"));
        assert!(attributes.has_class("b"));
        assert!(!attributes.has_class("ab"));
    }

    #[test]
    fn empty_class_is_skipped() {
        let mut attributes = Attributes::new();
        attributes.add_class("a").remove_class("a");
        assert_eq!(print_to_string(&attributes), "");
    }

    #[test]
    fn replace_keeps_position() {
        let mut attributes = Attributes::new();
        attributes.add("a", "1").add("b", "2");
        attributes.replace("a", "3");
        assert_eq!(print_to_string(&attributes), " a=\"3\" b=\"2\"");
    }

    #[test]
    fn query_portion_is_encoded() {
        let mut attributes = Attributes::new();
        attributes.add("src", "img.php?name=a b&size=2");
        assert_eq!(
            print_to_string(&attributes),
            " src=\"img.php?name=a%20b&amp;size=2\""
        );
    }

    #[test]
    fn quotes_are_escaped_elsewhere() {
        let mut attributes = Attributes::new();
        attributes.add("title", "say \"hi\"");
        assert_eq!(print_to_string(&attributes), " title=\"say \\\"hi\\\"\"");
    }
}
