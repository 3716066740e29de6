pub mod select_type_input;
