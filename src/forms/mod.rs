//! Interactive terminal forms that collect user input into structured data.
//!
//! Forms are declared as YAML documents containing typed properties
//! (string, password, integer, float, bool, object, array) presented to the
//! user one by one. Properties support conditional expressions, validation
//! expressions, enums, defaults and nested sub-properties. Collected
//! answers are assembled through an entry tree (see `tree`) that supports
//! querying partially-built results, which is what lets a conditional
//! reference earlier answers.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

mod expr;
mod markup;
mod prompt;
mod tree;


pub use prompt::{DialoguerPrompter, Prompter, Validator};

use prompt::required_validator;
use tree::{EntryTree, NodeId};

/// IfEmpty constants control what value is emitted when a property answer
/// is empty.
pub const ARRAY_IF_EMPTY: &str = "array";
pub const OBJECT_IF_EMPTY: &str = "object";
pub const ABSENT_IF_EMPTY: &str = "absent";

/// Type constants identify property types in form definitions.
pub const STRING_TYPE: &str = "string";
pub const BOOL_TYPE: &str = "bool";
pub const INT_TYPE: &str = "integer";
pub const FLOAT_TYPE: &str = "float";
pub const PASSWORD_TYPE: &str = "password";
pub const OBJECT_TYPE: &str = "object";
pub const ARRAY_TYPE: &str = "array";

/// An interactive form: a name, a description and the properties to present
/// to the user. The description supports template syntax and color markup
/// tags like `{red}text{/red}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Form {
    pub name: String,
    pub description: String,
    pub properties: Vec<Property>,
}

/// A single form field. `type` determines the input method; properties with
/// sub-properties create nested structures. `conditional` is an expression
/// evaluated against the environment and the answers collected so far to
/// decide whether to present this property.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Property {
    pub name: String,
    pub description: String,
    pub help: String,
    #[serde(rename = "empty")]
    pub if_empty: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub conditional: String,
    pub validation: String,
    pub required: bool,
    pub default: String,
    #[serde(rename = "enum")]
    pub choices: Vec<String>,
    pub properties: Vec<Property>,
}

impl Property {
    /// Executes the property description as a template against `env`, then
    /// applies color markup to the result.
    pub fn rendered_description(&self, env: &Map<String, Value>) -> Result<String> {
        render_template(&self.description, env)
    }
}

fn render_template(template: &str, env: &Map<String, Value>) -> Result<String> {
    let jinja = minijinja::Environment::new();
    let out = jinja
        .render_str(template, env)
        .map_err(|e| Error::Template(e.to_string()))?;

    Ok(markup::color_markup(&out))
}

fn default_is_terminal() -> bool {
    console::user_attended()
}

/// Injection points for form processing. Production code uses the
/// defaults: a dialoguer prompter, a real terminal check and stdout.
pub struct ProcessOptions {
    prompter: Box<dyn Prompter>,
    is_terminal: Box<dyn Fn() -> bool>,
    output: Box<dyn Write>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            prompter: Box::new(DialoguerPrompter::new()),
            is_terminal: Box::new(default_is_terminal),
            output: Box::new(io::stdout()),
        }
    }
}

impl ProcessOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Box::new(prompter);
        self
    }

    pub fn with_is_terminal(mut self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.is_terminal = Box::new(predicate);
        self
    }

    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }
}

/// Reads YAML form data from `r` and processes it interactively.
pub fn process_reader(
    mut r: impl Read,
    env: &Map<String, Value>,
    opts: ProcessOptions,
) -> Result<Map<String, Value>> {
    let mut data = Vec::new();
    r.read_to_end(&mut data)?;

    process_bytes(&data, env, opts)
}

/// Reads YAML form data from the file at `path` and processes it
/// interactively.
pub fn process_file(
    path: impl AsRef<Path>,
    env: &Map<String, Value>,
    opts: ProcessOptions,
) -> Result<Map<String, Value>> {
    let data = fs::read(path)?;

    process_bytes(&data, env, opts)
}

/// Parses `data` as a YAML form definition and processes it interactively.
pub fn process_bytes(
    data: &[u8],
    env: &Map<String, Value>,
    opts: ProcessOptions,
) -> Result<Map<String, Value>> {
    let form: Form = serde_yaml::from_slice(data)
        .map_err(|e| Error::Input(format!("invalid form definition: {}", e)))?;

    process_form(form, env, opts)
}

/// Presents the form interactively and returns the collected answers as a
/// map. Requires a valid terminal. The env map provides template variables
/// for descriptions and conditional expressions.
pub fn process_form(
    form: Form,
    env: &Map<String, Value>,
    mut opts: ProcessOptions,
) -> Result<Map<String, Value>> {
    if !(opts.is_terminal)() {
        return Err(Error::Input(
            "can only process forms on a valid terminal".to_string(),
        ));
    }

    if form.properties.is_empty() {
        return Err(Error::Input("no properties defined".to_string()));
    }

    let description = render_template(&form.description, env)?;
    writeln!(opts.output, "{}", description)?;
    writeln!(opts.output)?;

    let _ = opts.prompter.input("Press enter to start", "", "", &[]);

    let mut proc = Processor {
        env,
        prompter: opts.prompter.as_mut(),
        output: opts.output.as_mut(),
        tree: EntryTree::new(),
    };

    let root = proc.tree.object(Map::new());
    proc.ask_properties(&form.properties, root, root)?;

    let (_, value) = proc.tree.combined(root);
    match value {
        Value::Object(result) => Ok(result),
        other => Err(Error::Input(format!(
            "unexpected form result type: {}",
            other
        ))),
    }
}

fn single(key: String, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key, value);
    map
}

/// The placeholder recorded when an empty answer is kept, by IfEmpty policy.
fn property_empty_val(prop: &Property) -> Map<String, Value> {
    match prop.if_empty.as_str() {
        ARRAY_IF_EMPTY => single(prop.name.clone(), Value::Array(Vec::new())),
        OBJECT_IF_EMPTY => single(prop.name.clone(), Value::Object(Map::new())),
        _ => Map::new(),
    }
}

/// Walks a property list interactively, building the entry tree.
struct Processor<'a> {
    env: &'a Map<String, Value>,
    prompter: &'a mut dyn Prompter,
    output: &'a mut dyn Write,
    tree: EntryTree,
}

impl Processor<'_> {
    /// Asks every property in order, skipping those whose conditional
    /// evaluates to false against the answers collected so far.
    fn ask_properties(
        &mut self,
        props: &[Property],
        parent: NodeId,
        root: NodeId,
    ) -> Result<()> {
        for prop in props {
            if !self.should_process(prop, root)? {
                continue;
            }

            self.ask_property(prop, parent, root)?;
        }

        Ok(())
    }

    /// Dispatches a single property to the appropriate type handler.
    fn ask_property(&mut self, prop: &Property, parent: NodeId, root: NodeId) -> Result<()> {
        let kind = prop.kind.as_str();

        if kind == ARRAY_TYPE {
            return self.ask_array_type(prop, parent, root);
        }

        if (kind == OBJECT_TYPE || kind.is_empty()) && !prop.properties.is_empty() {
            return self.ask_obj_with_properties(prop, parent, root);
        }

        match kind {
            BOOL_TYPE => self.ask_bool(prop, parent),
            INT_TYPE => self.ask_int(prop, parent),
            FLOAT_TYPE => self.ask_float(prop, parent),
            STRING_TYPE | PASSWORD_TYPE | "" => self.ask_string(prop, parent),
            other => Err(Error::Input(format!("unsupported property type {:?}", other))),
        }
    }

    /// Evaluates the property conditional against the environment merged
    /// with the combined answers so far, available as `input` and `Input`.
    fn should_process(&mut self, prop: &Property, root: NodeId) -> Result<bool> {
        if prop.conditional.is_empty() {
            return Ok(true);
        }

        let mut env = self.env.clone();
        let (_, input) = self.tree.combined(root);
        env.insert("input".to_string(), input.clone());
        env.insert("Input".to_string(), input);

        expr::evaluate(&env, &prop.conditional)
    }

    fn print_description(&mut self, prop: &Property) -> Result<()> {
        let d = prop.rendered_description(self.env)?;
        writeln!(self.output)?;
        writeln!(self.output, "{}", d)?;
        writeln!(self.output)?;

        Ok(())
    }

    /// Prompts for a string or password answer and records it, honoring
    /// the IfEmpty policy for empty answers.
    fn ask_string(&mut self, prop: &Property, parent: NodeId) -> Result<()> {
        let ans = self.ask_string_value(prop)?;

        let map = if ans.is_empty() && prop.if_empty == ABSENT_IF_EMPTY {
            return Ok(());
        } else if ans.is_empty() && !prop.if_empty.is_empty() {
            property_empty_val(prop)
        } else {
            single(prop.name.clone(), Value::String(ans))
        };

        let child = self.tree.object(map);
        self.tree.add_child(parent, child)?;

        Ok(())
    }

    fn ask_string_value(&mut self, prop: &Property) -> Result<String> {
        self.print_description(prop)?;

        if !prop.choices.is_empty() {
            return self.ask_string_enum(prop);
        }

        let mut validators: Vec<Validator> = Vec::new();
        if prop.required {
            validators.push(required_validator());
        }
        if !prop.validation.is_empty() {
            validators.push(expr::validator(&prop.validation, prop.required));
        }

        if prop.kind == PASSWORD_TYPE {
            self.prompter.password(&prop.name, &prop.help, &validators)
        } else {
            self.prompter
                .input(&prop.name, &prop.help, &prop.default, &validators)
        }
    }

    fn ask_string_enum(&mut self, prop: &Property) -> Result<String> {
        let default = if prop.default.is_empty() {
            prop.choices[0].clone()
        } else {
            prop.default.clone()
        };

        self.prompter
            .select(&prop.name, &prop.help, &prop.choices, &default)
    }

    fn ask_bool(&mut self, prop: &Property, parent: NodeId) -> Result<()> {
        self.print_description(prop)?;

        let default = if prop.default.is_empty() {
            false
        } else {
            prop.default.trim().parse::<bool>().map_err(|_| {
                Error::Input(format!("invalid bool default {:?}", prop.default))
            })?
        };

        let ans = self.prompter.confirm(&prop.name, default)?;

        let child = self.tree.object(single(prop.name.clone(), Value::Bool(ans)));
        self.tree.add_child(parent, child)?;

        Ok(())
    }

    fn ask_int(&mut self, prop: &Property, parent: NodeId) -> Result<()> {
        let ans = self.ask_numeric_value(prop, "isInt(value)")?;
        let n: i64 = ans
            .trim()
            .parse()
            .map_err(|_| Error::Input(format!("invalid integer {:?}", ans)))?;

        let child = self.tree.object(single(prop.name.clone(), Value::from(n)));
        self.tree.add_child(parent, child)?;

        Ok(())
    }

    fn ask_float(&mut self, prop: &Property, parent: NodeId) -> Result<()> {
        let ans = self.ask_numeric_value(prop, "isFloat(value)")?;
        let n: f64 = ans
            .trim()
            .parse()
            .map_err(|_| Error::Input(format!("invalid float {:?}", ans)))?;

        let child = self.tree.object(single(prop.name.clone(), Value::from(n)));
        self.tree.add_child(parent, child)?;

        Ok(())
    }

    /// Prompts for a text answer validated by the given builtin expression
    /// ANDed with any user validation.
    fn ask_numeric_value(&mut self, prop: &Property, builtin: &str) -> Result<String> {
        self.print_description(prop)?;

        let expression = if prop.validation.is_empty() {
            builtin.to_string()
        } else {
            format!("{} && {}", builtin, prop.validation)
        };

        let validators = vec![expr::validator(&expression, true)];

        self.prompter
            .input(&prop.name, &prop.help, &prop.default, &validators)
    }

    /// Handles object and namespaced properties that have sub-properties.
    /// Object properties loop, asking a unique entry name each iteration;
    /// untyped properties collect a single set of answers under their name.
    fn ask_obj_with_properties(
        &mut self,
        prop: &Property,
        parent: NodeId,
        root: NodeId,
    ) -> Result<()> {
        self.print_description(prop)?;

        let mut first_entry = true;

        loop {
            // Required objects must collect their first entry; everything
            // else is gated on a confirmation.
            if prop.kind == OBJECT_TYPE && (!first_entry || !prop.required) {
                let ok = self
                    .prompter
                    .confirm(&format!("Add {} entry", prop.name), false)?;

                if !ok {
                    let child = self.tree.object(property_empty_val(prop));
                    self.tree.add_child(parent, child)?;
                    return Ok(());
                }
            }

            let name = if prop.kind == OBJECT_TYPE {
                self.prompter.input(
                    "Unique name for this entry",
                    &prop.help,
                    "",
                    &[required_validator()],
                )?
            } else {
                prop.name.clone()
            };

            let child = self.tree.object(single(name, Value::Null));
            self.tree.add_child(parent, child)?;

            self.ask_properties(&prop.properties, child, root)?;

            first_entry = false;

            // untyped groups are asked exactly once
            if prop.kind.is_empty() {
                return Ok(());
            }
        }
    }

    /// Collects an array property and attaches the result as a holder
    /// object with an array child. Nothing is recorded when the user
    /// declines an empty optional array marked absent-if-empty.
    fn ask_array_type(&mut self, prop: &Property, parent: NodeId, root: NodeId) -> Result<()> {
        let Some(items) = self.ask_array_values(prop, root)? else {
            return Ok(());
        };

        let holder = self
            .tree
            .object(single(prop.name.clone(), Value::Array(Vec::new())));
        self.tree.add_child(parent, holder)?;

        let array = self.tree.array(items);
        self.tree.add_child(holder, array)?;

        Ok(())
    }

    fn ask_array_values(&mut self, prop: &Property, root: NodeId) -> Result<Option<Vec<Value>>> {
        if !prop.properties.is_empty() {
            let mut answers: Vec<Value> = Vec::new();

            loop {
                if !answers.is_empty() || !prop.required {
                    let msg = if answers.is_empty() {
                        format!("Add first '{}' entry", prop.name)
                    } else {
                        format!("Add additional '{}' entry", prop.name)
                    };

                    if !self.prompter.confirm(&msg, false)? {
                        if !answers.is_empty() {
                            return Ok(Some(answers));
                        }

                        if prop.if_empty == ABSENT_IF_EMPTY {
                            return Ok(None);
                        }

                        return Ok(Some(vec![Value::Object(property_empty_val(prop))]));
                    }
                }

                let scratch = self.tree.object(Map::new());
                self.ask_properties(&prop.properties, scratch, root)?;

                let (_, combined) = self.tree.combined(scratch);
                match combined {
                    Value::Object(_) => answers.push(combined),
                    other => {
                        return Err(Error::Input(format!(
                            "unexpected array entry type: {}",
                            other
                        )))
                    }
                }
            }
        }

        let mut answers: Vec<Value> = Vec::new();

        loop {
            let mut ok = true;

            if !answers.is_empty() || !prop.required {
                let msg = if answers.is_empty() {
                    format!("Add first '{}' entry", prop.name)
                } else {
                    format!("Add additional '{}' entry", prop.name)
                };

                ok = self.prompter.confirm(&msg, false)?;
            }

            let mut val = String::new();
            if ok {
                val = self.ask_string_value(prop)?;
            }

            if val.is_empty() {
                break;
            }

            answers.push(Value::String(val));
        }

        writeln!(self.output)?;

        Ok(Some(answers))
    }
}
