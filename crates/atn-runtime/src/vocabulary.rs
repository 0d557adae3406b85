/// Maps token types to the names a grammar author would recognize, used
/// only for diagnostics (error messages, `debug_atn` tracing).
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
  literal_names: Vec<Option<String>>,
  symbolic_names: Vec<Option<String>>,
}

impl Vocabulary {
  pub fn new(literal_names: Vec<Option<String>>, symbolic_names: Vec<Option<String>>) -> Self {
    Self { literal_names, symbolic_names }
  }

  pub fn literal_name(&self, token_type: isize) -> Option<&str> {
    self.by_index(&self.literal_names, token_type)
  }

  pub fn symbolic_name(&self, token_type: isize) -> Option<&str> {
    self.by_index(&self.symbolic_names, token_type)
  }

  /// Best-effort display name: literal, falling back to symbolic, falling
  /// back to the raw integer.
  pub fn display_name(&self, token_type: isize) -> String {
    if let Some(name) = self.literal_name(token_type) {
      return name.to_string();
    }
    if let Some(name) = self.symbolic_name(token_type) {
      return name.to_string();
    }
    token_type.to_string()
  }

  fn by_index<'a>(&self, table: &'a [Option<String>], token_type: isize) -> Option<&'a str> {
    if token_type < 0 {
      return None;
    }
    table.get(token_type as usize).and_then(|n| n.as_deref())
  }
}
