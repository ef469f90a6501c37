fn main() {
    elf2rpl::converter_main();
}
