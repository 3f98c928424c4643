//! Translation modules and function declarations.

use std::{collections::BTreeMap, fmt};

use bitflags::bitflags;

use crate::{
    ir::{Function, IrType},
    metadata::ShaderStage,
    Error, Result,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Attributes of a declared function.
    pub struct FunctionAttrs: u32 {
        /// Reads and writes no memory, always returns, never unwinds.
        /// Calls to such functions can be removed when their result is unused.
        const PURE = 0x0001;
        /// Should always be inlined by later stages.
        const ALWAYS_INLINE = 0x0002;
    }
}

/// A declared (external or library) function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Symbol name, usually mangled.
    pub name: String,
    /// Return type.
    pub ret: IrType,
    /// Parameter types.
    pub params: Vec<IrType>,
    /// Attributes.
    pub attrs: FunctionAttrs,
}

impl FunctionDecl {
    /// Creates a declaration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ret: IrType,
        params: Vec<IrType>,
        attrs: FunctionAttrs,
    ) -> Self {
        Self {
            name: name.into(),
            ret,
            params,
            attrs,
        }
    }
}

/// The declaration table of a module, keyed by symbol name.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    entries: BTreeMap<String, FunctionDecl>,
}

impl Declarations {
    /// Adds a declaration, replacing any previous one with the same name.
    pub fn declare(&mut self, decl: FunctionDecl) {
        self.entries.insert(decl.name.clone(), decl);
    }

    /// Adds a declaration unless one with the same name exists.
    ///
    /// Returns the declaration now registered under that name.
    pub fn get_or_declare(&mut self, decl: FunctionDecl) -> &FunctionDecl {
        self.entries.entry(decl.name.clone()).or_insert(decl)
    }

    /// Looks up a declaration.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FunctionDecl> {
        self.entries.get(name)
    }

    /// Returns `true` if calls to `name` have no side effects.
    ///
    /// Undeclared callees are assumed to have side effects.
    #[must_use]
    pub fn is_pure(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|decl| decl.attrs.contains(FunctionAttrs::PURE))
    }

    /// Returns the number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over declarations in name order.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.entries.values()
    }
}

/// A complete translation unit for one shader stage.
///
/// The fields are public so a pass can borrow the functions mutably while reading
/// the declarations.
#[derive(Debug, Clone)]
pub struct Module {
    /// Module name, for diagnostics.
    pub name: String,
    /// The shader stage this module implements.
    pub stage: ShaderStage,
    /// Function definitions.
    pub functions: Vec<Function>,
    /// Index of the entry point in `functions`.
    pub entry_point: Option<usize>,
    /// Declared callees.
    pub declarations: Declarations,
}

impl Module {
    /// Creates an empty module.
    #[must_use]
    pub fn new(name: impl Into<String>, stage: ShaderStage) -> Self {
        Self {
            name: name.into(),
            stage,
            functions: Vec::new(),
            entry_point: None,
            declarations: Declarations::default(),
        }
    }

    /// Adds a function and returns its index.
    pub fn add_function(&mut self, function: Function) -> usize {
        self.functions.push(function);
        self.functions.len() - 1
    }

    /// Adds a function and makes it the entry point.
    pub fn set_entry_point(&mut self, function: Function) -> usize {
        let index = self.add_function(function);
        self.entry_point = Some(index);
        index
    }

    /// Returns the entry-point function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEntryPoint`] if none is set or the index is stale.
    pub fn entry(&self) -> Result<&Function> {
        self.entry_point
            .and_then(|index| self.functions.get(index))
            .ok_or(Error::MissingEntryPoint)
    }

    /// Returns the entry-point function mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEntryPoint`] if none is set or the index is stale.
    pub fn entry_mut(&mut self) -> Result<&mut Function> {
        self.entry_point
            .and_then(|index| self.functions.get_mut(index))
            .ok_or(Error::MissingEntryPoint)
    }

    /// Looks up a function definition by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name() == name)
    }

    /// Verifies every function in the module.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Malformed`] reported by [`Function::verify`].
    pub fn verify(&self) -> Result<()> {
        self.functions.iter().try_for_each(Function::verify)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {} ({})", self.name, self.stage)?;
        for decl in self.declarations.iter() {
            write!(f, "declare {} @{}(", decl.ret, decl.name)?;
            for (i, param) in decl.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{param}")?;
            }
            writeln!(f, ")")?;
        }
        for function in &self.functions {
            writeln!(f)?;
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
