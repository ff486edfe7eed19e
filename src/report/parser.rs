//! Event-driven XML parser producing the typed report tree.

use super::{Attributes, Content, Element, Group, ReportNode, TESTCASE_TAG, TestCase};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parse a document into its root node.
///
/// Errors are returned as a message; the caller attaches the file path.
pub(super) fn parse(xml: &str) -> Result<ReportNode, String> {
    parse_element_tree(xml).map(into_node)
}

/// Read the raw element tree with quick-xml.
fn parse_element_tree(xml: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{e} (at byte {})", reader.buffer_position()))?;

        match event {
            Event::Start(e) => stack.push(element_from_start(&e)?),
            Event::Empty(e) => {
                let element = element_from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "closing tag without a matching start tag".to_string())?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                push_text(&mut stack, text.into_owned())?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                push_text(&mut stack, text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes carry no results.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document: <{}> is not closed", open.tag));
    }

    root.ok_or_else(|| "no element found".to_string())
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, String> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Attributes::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.insert(key, value.into_owned());
    }
    Ok(Element {
        tag,
        attributes,
        content: Vec::new(),
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.content.push(Content::Element(element));
        Ok(())
    } else if root.is_some() {
        Err(format!("junk after document element: <{}>", element.tag))
    } else {
        *root = Some(element);
        Ok(())
    }
}

/// Append character data to the open element.
///
/// Whitespace-only runs are layout between elements and are dropped; any
/// other text is kept exactly, so failure bodies keep their indentation.
fn push_text(stack: &mut [Element], text: String) -> Result<(), String> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(parent) => {
            parent.content.push(Content::Text(text));
            Ok(())
        }
        None => Err("text outside of the document element".to_string()),
    }
}

/// Convert a raw element into its typed node.
fn into_node(element: Element) -> ReportNode {
    if element.tag == TESTCASE_TAG {
        return ReportNode::Case(into_case(element));
    }

    let children = element
        .content
        .into_iter()
        .map(|c| match c {
            Content::Element(e) => into_node(e),
            Content::Text(t) => ReportNode::Text(t),
        })
        .collect();

    ReportNode::from_group(Group {
        tag: element.tag,
        attributes: element.attributes,
        children,
    })
}

fn into_case(element: Element) -> TestCase {
    TestCase {
        attributes: element.attributes,
        content: element.content,
    }
}
