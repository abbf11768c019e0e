//! Graph files
//!
//! Parsers for the two graph-file formats accepted by the upload flow:
//! GML (`graph [ directed 1 node [ id 0 label "x" ] edge [ source 0 target 1 ] ]`)
//! and a subset of DOT (`digraph { x -> y; }`). Both produce a plain node and
//! edge list; names are validated against the dataset later, by the graph model.
use crate::errors::GraphError;

/// Nodes and directed edges read from a graph file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphFile {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
}

impl GraphFile {
    /// Parse the raw bytes of a GML or DOT file, detecting the format from the content.
    pub fn parse(bytes: &[u8]) -> Result<Self, GraphError> {
        let text = std::str::from_utf8(bytes).map_err(|e| GraphError::GraphData(e.to_string()))?;
        let head = text.trim_start();
        if head.starts_with("digraph") || head.starts_with("strict") {
            parse_dot(text)
        } else if head.starts_with("graph") && head["graph".len()..].trim_start().starts_with('{') {
            Err(GraphError::Undirected)
        } else {
            parse_gml(text)
        }
    }

    fn add_node(&mut self, name: &str) {
        if !self.nodes.iter().any(|n| n == name) {
            self.nodes.push(name.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Word(String),
    Quoted(String),
}

fn tokenize_gml(text: &str) -> Result<Vec<Token>, GraphError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '[' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ']' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    s.push(c);
                }
                if !closed {
                    return Err(GraphError::GraphData("unterminated string".to_string()));
                }
                tokens.push(Token::Quoted(s.replace("&quot;", "\"")));
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut s = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '[' || c == ']' || c == '"' {
                        break;
                    }
                    s.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(s));
            }
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
enum GmlValue {
    Scalar(String),
    List(Vec<(String, GmlValue)>),
}

fn parse_gml_list(tokens: &[Token], pos: &mut usize, nested: bool) -> Result<Vec<(String, GmlValue)>, GraphError> {
    let mut items = Vec::new();
    loop {
        let key = match tokens.get(*pos) {
            None if nested => return Err(GraphError::GraphData("missing closing bracket".to_string())),
            None => return Ok(items),
            Some(Token::Close) if nested => {
                *pos += 1;
                return Ok(items);
            }
            Some(Token::Word(k)) => k.clone(),
            Some(t) => return Err(GraphError::GraphData(format!("expected a key, found {:?}", t))),
        };
        *pos += 1;
        let value = match tokens.get(*pos) {
            Some(Token::Open) => {
                *pos += 1;
                GmlValue::List(parse_gml_list(tokens, pos, true)?)
            }
            Some(Token::Word(v)) | Some(Token::Quoted(v)) => {
                *pos += 1;
                GmlValue::Scalar(v.clone())
            }
            _ => return Err(GraphError::GraphData(format!("key {} has no value", key))),
        };
        items.push((key, value));
    }
}

fn scalar<'a>(items: &'a [(String, GmlValue)], key: &str) -> Option<&'a str> {
    items.iter().find_map(|(k, v)| match v {
        GmlValue::Scalar(s) if k == key => Some(s.as_str()),
        _ => None,
    })
}

fn parse_gml(text: &str) -> Result<GraphFile, GraphError> {
    let tokens = tokenize_gml(text)?;
    let mut pos = 0;
    let top = parse_gml_list(&tokens, &mut pos, false)?;
    let graph = top
        .iter()
        .find_map(|(k, v)| match v {
            GmlValue::List(items) if k == "graph" => Some(items),
            _ => None,
        })
        .ok_or_else(|| GraphError::GraphData("no graph section found".to_string()))?;

    if scalar(graph, "directed") == Some("0") {
        return Err(GraphError::Undirected);
    }

    let mut file = GraphFile::default();
    let mut ids: Vec<(String, String)> = Vec::new();
    for (key, value) in graph.iter() {
        if let (true, GmlValue::List(items)) = (key == "node", value) {
            let id = scalar(items, "id").ok_or_else(|| GraphError::GraphData("node without id".to_string()))?;
            let name = scalar(items, "label").unwrap_or(id);
            ids.push((id.to_string(), name.to_string()));
            file.add_node(name);
        }
    }

    let lookup = |id: &str| -> Result<String, GraphError> {
        ids.iter()
            .find(|(i, _)| i == id)
            .map(|(_, name)| name.clone())
            .ok_or_else(|| GraphError::GraphData(format!("edge references unknown node {}", id)))
    };
    for (key, value) in graph.iter() {
        if let (true, GmlValue::List(items)) = (key == "edge", value) {
            let source = scalar(items, "source").ok_or_else(|| GraphError::GraphData("edge without source".to_string()))?;
            let target = scalar(items, "target").ok_or_else(|| GraphError::GraphData("edge without target".to_string()))?;
            file.edges.push((lookup(source)?, lookup(target)?));
        }
    }
    Ok(file)
}

fn strip_dot_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            continue;
        }
        match line.find("//") {
            Some(i) => out.push_str(&line[..i]),
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

fn dot_identifier(raw: &str) -> Option<String> {
    let without_attrs = match raw.find('[') {
        Some(i) => &raw[..i],
        None => raw,
    };
    let name = without_attrs.trim().trim_matches('"').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn parse_dot(text: &str) -> Result<GraphFile, GraphError> {
    let text = strip_dot_comments(text);
    let open = text
        .find('{')
        .ok_or_else(|| GraphError::GraphData("missing opening brace".to_string()))?;
    let close = text
        .rfind('}')
        .filter(|&c| c > open)
        .ok_or_else(|| GraphError::GraphData("missing closing brace".to_string()))?;

    let mut file = GraphFile::default();
    // Braces only group statements, so subgraph bodies are read as if inline.
    for statement in text[open + 1..close].split(|c| matches!(c, ';' | '\n' | '{' | '}')) {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        if statement.contains("--") && !statement.contains("->") {
            return Err(GraphError::Undirected);
        }
        if statement.contains("->") {
            let names: Vec<String> = statement.split("->").filter_map(dot_identifier).collect();
            if names.len() < 2 {
                return Err(GraphError::GraphData(format!("incomplete edge statement {}", statement)));
            }
            for name in names.iter() {
                file.add_node(name);
            }
            for pair in names.windows(2) {
                file.edges.push((pair[0].clone(), pair[1].clone()));
            }
            continue;
        }
        let keyword = statement.split(|c: char| c.is_whitespace() || c == '[').next().unwrap_or("");
        if (statement.contains('=') && !statement.contains('[')) || matches!(keyword, "node" | "edge" | "graph" | "subgraph") {
            continue;
        }
        if let Some(name) = dot_identifier(statement) {
            file.add_node(&name);
        }
    }
    Ok(file)
}
