mod cascade;
mod format_concat;
