use crate::dom::{LoadedScript, ScriptElement};

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Anything that is not a script, kept verbatim.
    Markup(String),
    Script(ScriptElement),
}

/// A page reduced to what consent handling needs: verbatim markup segments,
/// script elements and the registry of scripts activated so far.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    loaded: Vec<LoadedScript>,
    anonymous: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits raw HTML into markup segments and `<script>` elements.
    ///
    /// An unterminated `<script` tag or element is kept as markup, and so is
    /// everything inside `<!-- -->`.
    pub fn parse(html: &str) -> Self {
        let mut doc = Document::new();
        let bytes = html.as_bytes();
        let mut pos = 0;
        let mut markup_start = 0;

        while let Some(start) = find_ci(html, "<script", pos) {
            if let Some(comment) = html[pos..start].find("<!--").map(|i| i + pos) {
                let body = comment + "<!--".len();
                match html[body..].find("-->") {
                    Some(end) => {
                        pos = body + end + "-->".len();
                        continue;
                    }
                    None => break,
                }
            }

            let after = start + "<script".len();
            match bytes.get(after) {
                Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {}
                _ => {
                    // <scripts>, <scripting> ...
                    pos = after;
                    continue;
                }
            }

            let Some((attributes, tag_end)) = parse_attributes(html, after) else {
                break;
            };
            let Some(close) = find_ci(html, "</script", tag_end) else {
                break;
            };
            let close_end = html[close..]
                .find('>')
                .map_or(html.len(), |i| close + i + 1);

            if markup_start < start {
                doc.push_markup(&html[markup_start..start]);
            }
            doc.nodes.push(Node::Script(ScriptElement::from_parts(
                attributes,
                html[tag_end..close].to_string(),
                html[start..close_end].to_string(),
            )));

            pos = close_end;
            markup_start = close_end;
        }

        if markup_start < html.len() {
            doc.push_markup(&html[markup_start..]);
        }
        doc
    }

    pub fn push_markup(&mut self, markup: &str) -> NodeId {
        self.nodes.push(Node::Markup(markup.to_string()));
        NodeId(self.nodes.len() - 1)
    }

    pub fn push_script(&mut self, script: ScriptElement) -> NodeId {
        self.nodes.push(Node::Script(script));
        NodeId(self.nodes.len() - 1)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn script(&self, id: NodeId) -> Option<&ScriptElement> {
        match self.nodes.get(id.0)? {
            Node::Script(script) => Some(script),
            Node::Markup(_) => None,
        }
    }

    /// Ids of all script elements in document order.
    pub fn script_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, Node::Script(_)))
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Replaces the script at `id`. Returns false if `id` is not a script.
    pub fn replace_script(&mut self, id: NodeId, script: ScriptElement) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node @ Node::Script(_)) => {
                *node = Node::Script(script);
                true
            }
            _ => false,
        }
    }

    pub fn loaded(&self) -> &[LoadedScript] {
        &self.loaded
    }

    pub(crate) fn record_loaded(&mut self, script: LoadedScript) {
        self.loaded.push(script);
    }

    /// Id for an activated script without an `id` attribute.
    pub(crate) fn next_anonymous_id(&mut self) -> String {
        self.anonymous += 1;
        format!("script-{}", self.anonymous)
    }

    pub fn to_html(&self) -> String {
        self.nodes
            .iter()
            .map(|node| match node {
                Node::Markup(m) => m.clone(),
                Node::Script(s) => s.to_html(),
            })
            .collect()
    }
}

fn find_ci(hay: &str, needle: &str, from: usize) -> Option<usize> {
    let h = hay.as_bytes();
    let n = needle.as_bytes();
    if from >= h.len() {
        return None;
    }
    h[from..]
        .windows(n.len())
        .position(|w| w.eq_ignore_ascii_case(n))
        .map(|p| p + from)
}

/// Parses the attributes of an open tag starting at `from` (just past the tag
/// name). Returns the attributes and the index just past `>`.
fn parse_attributes(html: &str, from: usize) -> Option<(Vec<(String, Option<String>)>, usize)> {
    let bytes = html.as_bytes();
    let mut attributes = Vec::new();
    let mut i = from;

    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if *bytes.get(i)? == b'>' {
            return Some((attributes, i + 1));
        }

        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let name = html[name_start..i].to_string();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if bytes.get(j) != Some(&b'=') {
            attributes.push((name, None));
            continue;
        }

        i = j + 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match bytes.get(i)? {
            quote @ (b'"' | b'\'') => {
                let close = html[i + 1..].find(*quote as char)? + i + 1;
                let value = &html[i + 1..close];
                i = close + 1;
                value
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &html[value_start..i]
            }
        };
        attributes.push((name, Some(value.to_string())));
    }
}
