use super::*;

fn collect(text: &str) -> Vec<Node> {
    let mut s = XmlStream::from_str(text, "inline.xml");
    let mut out = Vec::new();
    while let Some(n) = s.next_node().unwrap() {
        out.push(n);
    }
    out
}

#[test]
fn open_leaf_and_close_are_distinguished() {
    let nodes = collect(r#"<?xml version="1.0"?><a x="1"><b/><!-- note --><c>text</c></a>"#);
    let names: Vec<String> = nodes
        .iter()
        .map(|n| match n {
            Node::Open(e) => format!("+{}", e.name),
            Node::Leaf(e) => format!("={}", e.name),
            Node::Close(n) => format!("-{n}"),
        })
        .collect();
    assert_eq!(names, vec!["+a", "=b", "+c", "-c", "-a"]);
}

#[test]
fn attributes_are_unescaped_and_typed() {
    let nodes = collect(r#"<e name="a &amp; b" n="3" f=" 1.5 " bad="x"/>"#);
    let Node::Leaf(e) = &nodes[0] else {
        panic!("expected leaf");
    };
    assert_eq!(e.attr("name"), Some("a & b"));
    assert_eq!(e.attr_u32("n", 0), 3);
    assert_eq!(e.attr_f64("f", 0.0), 1.5);
    assert_eq!(e.attr_u32("bad", 7), 7);
    assert_eq!(e.attr_or("missing", "dflt"), "dflt");
}

#[test]
fn skip_consumes_whole_subtree() {
    let mut s = XmlStream::from_str("<r><g><x><y/></x></g><after/></r>", "inline.xml");
    assert!(matches!(s.root().unwrap(), Node::Open(_)));
    let Node::Open(g) = s.expect_node().unwrap() else {
        panic!("expected <g>");
    };
    s.skip(&g).unwrap();
    match s.expect_node().unwrap() {
        Node::Leaf(e) => assert_eq!(e.name, "after"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn errors_carry_origin() {
    let mut s = XmlStream::from_str("<a><b></a>", "broken.xml");
    let mut err = None;
    for _ in 0..8 {
        match s.next_node() {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                err = Some(e);
                break;
            }
        }
    }
    let err = err.expect("mismatched tags must fail");
    assert!(err.to_string().contains("broken.xml"));
}

#[test]
fn truncated_document_fails_expect_node() {
    let mut s = XmlStream::from_str("", "empty.xml");
    assert!(s.expect_node().is_err());
}
