use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use crate::error::{Dash2HlsError, Dash2HlsResult};

/// One element of a parsed manifest.
///
/// Lookups compare local names only, so `cenc:pssh` can be queried as either
/// `cenc:pssh` or `pssh`, whatever prefix the manifest binds the namespace to.
/// Children are always exposed as a sequence: an element that occurs once and
/// an element that repeats are read the same way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestNode {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<ManifestNode>,
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

impl ManifestNode {
    pub fn parse(input: &str) -> Dash2HlsResult<Self> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<ManifestNode> = Vec::new();
        let mut root = None;
        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let node = Self::from_start(&start)?;
                    Self::attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| Dash2HlsError::content("unexpected closing tag"))?;
                    Self::attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = stack.last() {
            return Err(Dash2HlsError::content(format!(
                "element <{}> is never closed",
                unclosed.name
            )));
        }
        root.ok_or_else(|| Dash2HlsError::content("document has no root element"))
    }

    fn from_start(start: &BytesStart) -> Dash2HlsResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    fn attach(
        stack: &mut [ManifestNode],
        root: &mut Option<ManifestNode>,
        node: ManifestNode,
    ) -> Dash2HlsResult<()> {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        } else if root.is_some() {
            return Err(Dash2HlsError::content(format!(
                "unexpected second root element <{}>",
                node.name
            )));
        } else {
            *root = Some(node);
        }
        Ok(())
    }

    /// Qualified name as written in the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn is(&self, name: &str) -> bool {
        self.local_name() == local_name(name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        let wanted = local_name(name);
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| self.attributes.iter().find(|(key, _)| local_name(key) == wanted))
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed text content, `None` when empty.
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Every child element named `name`, in document order.
    pub fn children(&self, name: &str) -> Vec<&ManifestNode> {
        self.children.iter().filter(|child| child.is(name)).collect()
    }

    pub fn child(&self, name: &str) -> Option<&ManifestNode> {
        self.children.iter().find(|child| child.is(name))
    }

    /// Descends through `path`, collecting every node found at its end.
    pub fn descendants<'a>(&'a self, path: &[&str]) -> Vec<&'a ManifestNode> {
        let mut current = vec![self];
        for segment in path {
            current = current
                .into_iter()
                .flat_map(|node| node.children(segment))
                .collect();
        }
        current
    }
}
