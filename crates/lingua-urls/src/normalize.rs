//! Reverse templates from regular expressions.
//!
//! [`normalize`] turns a route regex into the list of concrete path templates
//! it can produce, each with its ordered parameter names. Placeholders use
//! the `%(name)s` form and a literal `%` is written `%%`.
//!
//! Supported reductions:
//!
//! - named groups become `%(name)s`; unnamed groups become `%(_0)s`, `%(_1)s`, ...
//! - `?`, `*` and `{0,n}` make the preceding item optional (one template
//!   without it, then one with it); `+` and `{n,m}` keep a single copy
//! - only the first branch of an alternation is used
//! - escapes yield their literal character; character classes and `.`
//!   yield a representative character
//! - anchors, flags and comments are dropped

/// A concrete path template with its ordered parameter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPattern {
	pub template: String,
	pub params: Vec<String>,
}

#[derive(Debug, Clone)]
enum Node {
	Literal(String),
	Param(String),
	Group(Vec<Node>),
	Optional(Box<Node>),
}

/// Every template `pattern` can produce, shortest variants first
///
/// # Examples
///
/// ```
/// use lingua_urls::normalize::normalize;
///
/// let variants = normalize(r"^news/(?P<year>\d{4})/(?:page-(?P<page>\d+)/)?$");
/// assert_eq!(variants[0].template, "news/%(year)s/");
/// assert_eq!(variants[1].template, "news/%(year)s/page-%(page)s/");
/// assert_eq!(variants[1].params, vec!["year", "page"]);
/// ```
pub fn normalize(pattern: &str) -> Vec<NormalizedPattern> {
	let mut parser = Parser {
		chars: pattern.chars().collect(),
		pos: 0,
		positional: 0,
	};
	let mut nodes = Vec::new();
	// A stray ')' at the top level is kept as a literal
	loop {
		nodes.extend(parser.parse_sequence());
		if parser.peek().is_none() {
			break;
		}
		parser.pos += 1;
		nodes.push(Node::Literal(")".to_string()));
	}
	expand(&nodes)
}

struct Parser {
	chars: Vec<char>,
	pos: usize,
	positional: usize,
}

impl Parser {
	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn peek_at(&self, offset: usize) -> Option<char> {
		self.chars.get(self.pos + offset).copied()
	}

	fn bump(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.pos += 1;
		Some(ch)
	}

	fn starts_with(&self, prefix: &str) -> bool {
		prefix
			.chars()
			.enumerate()
			.all(|(i, c)| self.peek_at(i) == Some(c))
	}

	/// Parse until an unmatched `)` or the end of input, leaving `)` unconsumed
	fn parse_sequence(&mut self) -> Vec<Node> {
		let mut nodes = Vec::new();
		while let Some(ch) = self.peek() {
			match ch {
				')' => break,
				'|' => {
					self.skip_alternatives();
					break;
				}
				'^' | '$' => {
					self.pos += 1;
				}
				_ => {
					if let Some(atom) = self.parse_atom() {
						let node = self.apply_quantifier(atom);
						nodes.push(node);
					}
				}
			}
		}
		nodes
	}

	fn parse_atom(&mut self) -> Option<Node> {
		let ch = self.bump()?;
		match ch {
			'\\' => self.parse_escape(),
			'.' => Some(Node::Literal(".".to_string())),
			'[' => Some(Node::Literal(self.parse_class().to_string())),
			'(' => self.parse_group(),
			'%' => Some(Node::Literal("%%".to_string())),
			other => Some(Node::Literal(other.to_string())),
		}
	}

	fn parse_escape(&mut self) -> Option<Node> {
		let ch = self.bump()?;
		let literal = match ch {
			'd' => "0".to_string(),
			'D' | 'w' | 'W' => "x".to_string(),
			's' => " ".to_string(),
			'S' => "x".to_string(),
			'b' | 'B' | 'A' | 'z' | 'Z' => return None,
			'n' => "\n".to_string(),
			't' => "\t".to_string(),
			'%' => "%%".to_string(),
			other => other.to_string(),
		};
		Some(Node::Literal(literal))
	}

	/// Consume a character class and return a character it accepts
	fn parse_class(&mut self) -> char {
		let negated = self.peek() == Some('^');
		if negated {
			self.pos += 1;
		}
		let mut representative = None;
		let mut first = true;
		while let Some(ch) = self.bump() {
			match ch {
				']' if !first => break,
				'\\' => {
					let escaped = self.bump();
					if representative.is_none() {
						representative = escaped.map(|e| match e {
							'd' => '0',
							'w' | 'W' | 'D' | 'S' => 'x',
							's' => ' ',
							other => other,
						});
					}
				}
				'[' if self.peek() == Some(':') => {
					// POSIX class such as [:alpha:]
					while let Some(inner) = self.bump() {
						if inner == ']' {
							break;
						}
					}
					representative.get_or_insert('x');
				}
				other => {
					representative.get_or_insert(other);
				}
			}
			first = false;
		}
		if negated {
			'x'
		} else {
			representative.unwrap_or('x')
		}
	}

	fn parse_group(&mut self) -> Option<Node> {
		if self.peek() != Some('?') {
			let name = format!("_{}", self.positional);
			self.positional += 1;
			self.skip_group_body();
			return Some(Node::Param(name));
		}
		self.pos += 1;

		let named = self.starts_with("P<")
			|| (self.peek() == Some('<') && !self.starts_with("<=") && !self.starts_with("<!"));
		if named {
			let offset = if self.peek() == Some('P') { 2 } else { 1 };
			self.pos += offset;
			let mut name = String::new();
			while let Some(ch) = self.bump() {
				if ch == '>' {
					break;
				}
				name.push(ch);
			}
			self.skip_group_body();
			return Some(Node::Param(name));
		}

		if self.starts_with("P=") {
			self.pos += 2;
			let mut name = String::new();
			while let Some(ch) = self.bump() {
				if ch == ')' {
					break;
				}
				name.push(ch);
			}
			return Some(Node::Param(name));
		}

		if self.peek() == Some(':') {
			self.pos += 1;
			let inner = self.parse_sequence();
			self.bump();
			return Some(Node::Group(inner));
		}

		// Flags (`(?i)`, `(?i:...)`), comments and assertions
		while let Some(ch) = self.peek() {
			match ch {
				')' => {
					self.pos += 1;
					return None;
				}
				':' => {
					self.pos += 1;
					let inner = self.parse_sequence();
					self.bump();
					return Some(Node::Group(inner));
				}
				c if c.is_ascii_alphabetic() || c == '-' => {
					self.pos += 1;
				}
				_ => {
					self.skip_group_body();
					return None;
				}
			}
		}
		None
	}

	/// Skip to just past the `)` closing the current group
	fn skip_group_body(&mut self) {
		let mut depth = 0usize;
		while let Some(ch) = self.bump() {
			match ch {
				'\\' => {
					self.bump();
				}
				'[' => {
					self.parse_class();
				}
				'(' => depth += 1,
				')' if depth == 0 => return,
				')' => depth -= 1,
				_ => {}
			}
		}
	}

	/// Skip the remaining branches of an alternation, leaving the closing `)`
	fn skip_alternatives(&mut self) {
		let mut depth = 0usize;
		while let Some(ch) = self.peek() {
			match ch {
				')' if depth == 0 => return,
				')' => depth -= 1,
				'(' => depth += 1,
				'\\' => self.pos += 1,
				'[' => {
					self.pos += 1;
					self.parse_class();
					continue;
				}
				_ => {}
			}
			self.pos += 1;
		}
	}

	fn apply_quantifier(&mut self, atom: Node) -> Node {
		let node = match self.peek() {
			Some('?') | Some('*') => {
				self.pos += 1;
				Node::Optional(Box::new(atom))
			}
			Some('+') => {
				self.pos += 1;
				atom
			}
			Some('{') => match self.parse_repetition() {
				Some(0) => Node::Optional(Box::new(atom)),
				Some(min) => match atom {
					Node::Literal(text) => Node::Literal(text.repeat(min)),
					other => other,
				},
				None => atom,
			},
			_ => return atom,
		};
		// Lazy or possessive suffix
		if matches!(self.peek(), Some('?') | Some('+')) {
			self.pos += 1;
		}
		node
	}

	/// Parse `{m}`, `{m,}` or `{m,n}` and return `m`; anything else is left untouched
	fn parse_repetition(&mut self) -> Option<usize> {
		let start = self.pos;
		self.pos += 1;
		let mut min = String::new();
		while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
			min.push(ch);
			self.pos += 1;
		}
		while self.peek().is_some_and(|c| c.is_ascii_digit() || c == ',') {
			self.pos += 1;
		}
		if min.is_empty() || self.peek() != Some('}') {
			self.pos = start;
			return None;
		}
		self.pos += 1;
		min.parse().ok()
	}
}

fn expand(nodes: &[Node]) -> Vec<NormalizedPattern> {
	let mut results = vec![NormalizedPattern {
		template: String::new(),
		params: Vec::new(),
	}];
	for node in nodes {
		let options = expand_node(node);
		results = results
			.iter()
			.flat_map(|head| {
				options.iter().map(move |tail| NormalizedPattern {
					template: format!("{}{}", head.template, tail.template),
					params: head.params.iter().chain(&tail.params).cloned().collect(),
				})
			})
			.collect();
	}
	results
}

fn expand_node(node: &Node) -> Vec<NormalizedPattern> {
	match node {
		Node::Literal(text) => vec![NormalizedPattern {
			template: text.clone(),
			params: Vec::new(),
		}],
		Node::Param(name) => vec![NormalizedPattern {
			template: format!("%({})s", name),
			params: vec![name.clone()],
		}],
		Node::Group(inner) => expand(inner),
		Node::Optional(inner) => {
			let mut options = vec![NormalizedPattern {
				template: String::new(),
				params: Vec::new(),
			}];
			options.extend(expand_node(inner));
			options
		}
	}
}
