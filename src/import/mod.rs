pub mod member_import;
