/// VGG network builders and input preprocessing.
pub mod vgg16;
