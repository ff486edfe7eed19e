//! Serialize a report tree back to XML.

use super::{Attributes, Content, Element, Group, ReportNode, TESTCASE_TAG, TestCase};
use crate::core::error::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io;

pub(super) fn write_document(root: &ReportNode, writer: impl io::Write) -> Result<()> {
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_node(root, &mut writer)?;

    // Add a trailing newline.
    writer.write_indent()?;
    Ok(())
}

fn write_node(node: &ReportNode, writer: &mut Writer<impl io::Write>) -> Result<()> {
    match node {
        ReportNode::Suite(group) | ReportNode::Section(group) | ReportNode::Unknown(group) => {
            write_group(group, writer)
        }
        ReportNode::Case(case) => write_case(case, writer),
        ReportNode::Text(text) => {
            writer.write_event(Event::Text(BytesText::new(text)))?;
            Ok(())
        }
    }
}

fn write_group(group: &Group, writer: &mut Writer<impl io::Write>) -> Result<()> {
    let start = start_tag(&group.tag, &group.attributes);
    if group.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &group.children {
        write_node(child, writer)?;
    }
    writer.write_event(Event::End(BytesEnd::new(group.tag.as_str())))?;
    Ok(())
}

fn write_case(case: &TestCase, writer: &mut Writer<impl io::Write>) -> Result<()> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let TestCase {
        attributes,
        content,
    } = case;

    let start = start_tag(TESTCASE_TAG, attributes);
    write_content(TESTCASE_TAG, start, content, writer)
}

fn write_element(element: &Element, writer: &mut Writer<impl io::Write>) -> Result<()> {
    let start = start_tag(&element.tag, &element.attributes);
    write_content(&element.tag, start, &element.content, writer)
}

fn write_content(
    tag: &str,
    start: BytesStart<'_>,
    content: &[Content],
    writer: &mut Writer<impl io::Write>,
) -> Result<()> {
    if content.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for item in content {
        match item {
            Content::Element(element) => write_element(element, writer)?,
            Content::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn start_tag<'a>(tag: &'a str, attributes: &'a Attributes) -> BytesStart<'a> {
    let mut start = BytesStart::new(tag);
    for (key, value) in attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    start
}
