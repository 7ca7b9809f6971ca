use xmltree::{Element, XMLNode};

pub(crate) trait ElementExt {
    fn new2<'a, N: Into<&'a str>>(n: N) -> Self;
    fn push(&mut self, e: Element);
}

impl ElementExt for Element {
    fn new2<'a, N: Into<&'a str>>(n: N) -> Element {
        let v: Vec<&str> = n.into().splitn(2, ':').collect();
        if v.len() == 1 {
            Element::new(v[0])
        } else {
            let mut e = Element::new(v[1]);
            e.prefix = Some(v[0].to_string());
            e
        }
    }

    fn push(&mut self, e: Element) {
        self.children.push(XMLNode::Element(e));
    }
}
