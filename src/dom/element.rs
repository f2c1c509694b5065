/// A `<script>` element: ordered attributes plus its inline body.
///
/// Attribute names are matched case-insensitively. A bare attribute
/// (`<script async>`) has no value and reads as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptElement {
    attributes: Vec<(String, Option<String>)>,
    body: String,
    /// Source text as parsed. Dropped on the first mutation.
    raw: Option<String>,
}

impl ScriptElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Adds a bare attribute such as `async` or `defer`.
    pub fn with_flag(mut self, name: &str) -> Self {
        self.raw = None;
        match self.position(name) {
            Some(i) => self.attributes[i].1 = None,
            None => self.attributes.push((name.to_string(), None)),
        }
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.raw = None;
        self.body = body.to_string();
        self
    }

    pub(crate) fn from_parts(attributes: Vec<(String, Option<String>)>, body: String, raw: String) -> Self {
        Self {
            attributes,
            body,
            raw: Some(raw),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.position(name)
            .map(|i| self.attributes[i].1.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Sets `name` to `value`, in place if the attribute exists, appended otherwise.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.raw = None;
        match self.position(name) {
            Some(i) => self.attributes[i].1 = Some(value.to_string()),
            None => self.attributes.push((name.to_string(), Some(value.to_string()))),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let i = self.position(name)?;
        self.raw = None;
        let (_, value) = self.attributes.remove(i);
        Some(value.unwrap_or_default())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.attributes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn script_type(&self) -> Option<&str> {
        self.attr("type")
    }

    /// True when the element still has its parsed source text.
    pub fn is_pristine(&self) -> bool {
        self.raw.is_some()
    }

    pub fn to_html(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }

        let mut html = String::from("<script");
        for (name, value) in &self.attributes {
            html.push(' ');
            html.push_str(name);
            match value {
                None => {}
                Some(v) if v.contains('"') => html.push_str(&format!("='{v}'")),
                Some(v) => html.push_str(&format!("=\"{v}\"")),
            }
        }
        html.push('>');
        html.push_str(&self.body);
        html.push_str("</script>");
        html
    }
}
