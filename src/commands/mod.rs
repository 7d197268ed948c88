pub mod extendflanks;
