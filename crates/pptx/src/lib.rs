//! PPTX (Office Open XML) template inspector.
//!
//! Reads the slide layouts of a .pptx template, a ZIP archive of XML parts,
//! into layout descriptors that can seed a layout registry.

pub mod template;

pub use template::TemplateInspector;
