// Re-emit a decoded place file as the classic XML document: a `roblox`
// root, one `Item` per instance nested under its parent, and a
// `Properties` block whose element names encode the value kinds. The
// synthesised `Parent` pseudo-property is structural (it drives the
// nesting) and is not written out as a property.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rbxfile_base::Result;
use rbxfile_fmt::{File, Instance, Value};
use std::io::Write;


pub fn write_xml<W: Write>(file: &File, out: W) -> Result<()> {
    let mut w = Writer::new_with_indent(out, b' ', 2);

    let mut root = BytesStart::new("roblox");
    root.push_attribute(("xmlns:xmime", "http://www.w3.org/2005/05/xmlmime"));
    root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
    root.push_attribute((
        "xsi:noNamespaceSchemaLocation",
        "http://www.roblox.com/roblox.xsd",
    ));
    root.push_attribute(("version", "4"));
    w.write_event(Event::Start(root))?;

    text_element(&mut w, "External", None, "null")?;
    text_element(&mut w, "External", None, "nil")?;

    // One pass to group children under their parents, then emit the
    // forest from the roots down.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); file.instances().len()];
    let mut roots: Vec<usize> = Vec::new();
    for (i, inst) in file.instances().iter().enumerate() {
        match file.parent(inst) {
            Some(parent) => children[parent.referent().0 as usize].push(i),
            None => roots.push(i),
        }
    }
    for &i in &roots {
        write_item(&mut w, file, &children, i)?;
    }

    w.write_event(Event::End(BytesEnd::new("roblox")))?;
    Ok(())
}

fn write_item<W: Write>(
    w: &mut Writer<W>,
    file: &File,
    children: &[Vec<usize>],
    index: usize,
) -> Result<()> {
    let inst: &Instance = &file.instances()[index];
    let class = file.class_of(inst);

    let mut item = BytesStart::new("Item");
    item.push_attribute(("class", class.name().to_string_lossy().as_ref()));
    item.push_attribute(("referent", format!("RBX{}", inst.referent()).as_str()));
    w.write_event(Event::Start(item))?;

    w.write_event(Event::Start(BytesStart::new("Properties")))?;
    for (def, value) in file.props(inst) {
        if def.name() == "Parent" {
            continue;
        }
        write_property(w, &def.name().to_string_lossy(), value)?;
    }
    w.write_event(Event::End(BytesEnd::new("Properties")))?;

    for &child in &children[index] {
        write_item(w, file, children, child)?;
    }

    w.write_event(Event::End(BytesEnd::new("Item")))?;
    Ok(())
}

fn write_property<W: Write>(w: &mut Writer<W>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::String(s) => {
            // Cluster grid blobs are binary; everything else is treated as
            // text and rendered lossily.
            if name == "ClusterGridV3" {
                text_element(w, "string", Some(name), &BASE64.encode(s.as_bytes()))
            } else {
                text_element(w, "string", Some(name), &s.to_string_lossy())
            }
        }
        Value::Bool(b) => text_element(w, "bool", Some(name), if *b { "true" } else { "false" }),
        Value::Int32(i) => text_element(w, "int", Some(name), &i.to_string()),
        Value::Float32(f) => text_element(w, "float", Some(name), &f.to_string()),
        Value::Float64(f) => text_element(w, "double", Some(name), &f.to_string()),
        Value::UDim2(u) => {
            let mut el = BytesStart::new("UDim2");
            el.push_attribute(("name", name));
            w.write_event(Event::Start(el))?;
            text_element(w, "XS", None, &u.x.scale.to_string())?;
            text_element(w, "XO", None, &u.x.offset.to_string())?;
            text_element(w, "YS", None, &u.y.scale.to_string())?;
            text_element(w, "YO", None, &u.y.offset.to_string())?;
            w.write_event(Event::End(BytesEnd::new("UDim2")))?;
            Ok(())
        }
        // Brick colors serialise as their palette code.
        Value::BrickColor(code) => text_element(w, "int", Some(name), &code.to_string()),
        Value::Color3(c) => {
            // Packed 0xAARRGGBB with a full alpha byte, written decimal.
            let packed: u32 = 0xff00_0000
                | ((c.r * 255.0) as u32 & 0xff) << 16
                | ((c.g * 255.0) as u32 & 0xff) << 8
                | ((c.b * 255.0) as u32 & 0xff);
            text_element(w, "Color3", Some(name), &packed.to_string())
        }
        Value::Vector2(v) => {
            let mut el = BytesStart::new("Vector2");
            el.push_attribute(("name", name));
            w.write_event(Event::Start(el))?;
            text_element(w, "X", None, &v.x.to_string())?;
            text_element(w, "Y", None, &v.y.to_string())?;
            w.write_event(Event::End(BytesEnd::new("Vector2")))?;
            Ok(())
        }
        Value::Vector3(v) => {
            let mut el = BytesStart::new("Vector3");
            el.push_attribute(("name", name));
            w.write_event(Event::Start(el))?;
            text_element(w, "X", None, &v.x.to_string())?;
            text_element(w, "Y", None, &v.y.to_string())?;
            text_element(w, "Z", None, &v.z.to_string())?;
            w.write_event(Event::End(BytesEnd::new("Vector3")))?;
            Ok(())
        }
        Value::CFrame(cf) => {
            let mut el = BytesStart::new("CoordinateFrame");
            el.push_attribute(("name", name));
            w.write_event(Event::Start(el))?;
            text_element(w, "X", None, &cf.position.x.to_string())?;
            text_element(w, "Y", None, &cf.position.y.to_string())?;
            text_element(w, "Z", None, &cf.position.z.to_string())?;
            for (i, r) in cf.rotation.iter().enumerate() {
                let tag = format!("R{}{}", i / 3, i % 3);
                text_element(w, &tag, None, &r.to_string())?;
            }
            w.write_event(Event::End(BytesEnd::new("CoordinateFrame")))?;
            Ok(())
        }
        Value::Token(t) => text_element(w, "token", Some(name), &t.to_string()),
        Value::Object(target) => {
            let text = match target {
                Some(r) => format!("RBX{}", r),
                None => "null".to_string(),
            };
            text_element(w, "Ref", Some(name), &text)
        }
        // Referents never survive decoding, and reserved kinds have no
        // defined XML form; leave them out of the document.
        Value::Referent(_) | Value::Unknown { .. } => Ok(()),
    }
}

fn text_element<W: Write>(
    w: &mut Writer<W>,
    element: &str,
    name: Option<&str>,
    text: &str,
) -> Result<()> {
    let mut el = BytesStart::new(element);
    if let Some(name) = name {
        el.push_attribute(("name", name));
    }
    w.write_event(Event::Start(el))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(element)))?;
    Ok(())
}
